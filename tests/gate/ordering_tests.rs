// tests/gate/ordering_tests.rs

#[cfg(test)]
mod tests {
    use crate::fixtures::policies::{Journal, RecordingPolicy};
    use crate::fixtures::test_clock::TestClock;
    use flux_gate::{AdmissionGate, ExecutionContext, StaticPolicySource};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn admit_and_release_follow_priority_order() {
        let journal = Journal::new();
        let source = StaticPolicySource::<str>::new()
            .timeout(Duration::from_secs(10))
            .policy(Arc::new(RecordingPolicy::new("five", 5, &journal)))
            .policy(Arc::new(RecordingPolicy::new("one", 1, &journal)))
            .policy(Arc::new(RecordingPolicy::new("three", 3, &journal)));
        let gate = AdmissionGate::with_clock(source, TestClock::new(0.0)).unwrap();
        let mut ctx = ExecutionContext::new();

        gate.enter(&mut ctx, "GetMap").unwrap();
        assert_eq!(journal.admits(), vec!["one", "three", "five"]);
        assert!(journal.releases().is_empty());

        gate.exit(&mut ctx, "GetMap");
        assert_eq!(journal.releases(), vec!["one", "three", "five"]);
    }

    #[test]
    fn equal_priorities_run_in_declaration_order() {
        let journal = Journal::new();
        let source = StaticPolicySource::<str>::new()
            .policy(Arc::new(RecordingPolicy::new("global", 2, &journal)))
            .policy(Arc::new(RecordingPolicy::new("per-user", 1, &journal)))
            .policy(Arc::new(RecordingPolicy::new("per-ip", 2, &journal)));
        let gate = AdmissionGate::with_clock(source, TestClock::new(0.0)).unwrap();
        let mut ctx = ExecutionContext::new();

        gate.enter(&mut ctx, "GetFeature").unwrap();
        gate.exit(&mut ctx, "GetFeature");

        assert_eq!(journal.admits(), vec!["per-user", "global", "per-ip"]);
        assert_eq!(journal.releases(), vec!["per-user", "global", "per-ip"]);
    }
}
