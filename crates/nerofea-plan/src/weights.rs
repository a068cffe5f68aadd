//! Per-topic learning-value weights.

/// Learning-value weight of a catalog topic.
///
/// Topics absent from the table weigh 1.0.
pub fn topic_weight(topic: &str) -> f64 {
    match topic {
        "Array" => 1.2,
        "String" => 1.1,
        "Binary Tree" => 1.3,
        "Graph" => 1.4,
        "Dynamic Programming" => 1.5,
        "Stack" => 1.0,
        "Queue" => 1.1,
        "Heap" => 1.3,
        "Binary Search" => 1.2,
        "Two Pointers" => 1.1,
        "Backtracking" => 1.4,
        "Linked List" => 1.2,
        "Binary Search Tree" => 1.3,
        "Design" => 1.1,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_topics_weighted() {
        assert_eq!(topic_weight("Dynamic Programming"), 1.5);
        assert_eq!(topic_weight("Graph"), 1.4);
        assert_eq!(topic_weight("Stack"), 1.0);
    }

    #[test]
    fn test_unknown_topic_defaults_to_one() {
        assert_eq!(topic_weight("Quantum Annealing"), 1.0);
    }
}
