// tests/gate/nesting_tests.rs

#[cfg(test)]
mod tests {
    use crate::fixtures::policies::{Journal, RecordingPolicy};
    use crate::fixtures::test_clock::TestClock;
    use flux_gate::{AdmissionGate, ExecutionContext, GateTelemetry, StaticPolicySource};
    use std::sync::Arc;
    use std::time::Duration;

    fn recording_gate(
        journal: &Journal,
    ) -> AdmissionGate<str, StaticPolicySource<str>, TestClock> {
        let source = StaticPolicySource::<str>::new()
            .timeout(Duration::from_secs(1))
            .policy(Arc::new(RecordingPolicy::new("global", 1, journal)));
        AdmissionGate::with_clock(source, TestClock::new(0.0)).unwrap()
    }

    #[test]
    fn nested_entries_share_one_admission() {
        for depth in 1..=4 {
            let journal = Journal::new();
            let gate = recording_gate(&journal);
            let mut ctx = ExecutionContext::new();

            for _ in 0..depth {
                gate.enter(&mut ctx, "GetMap").unwrap();
                assert_eq!(gate.telemetry(), GateTelemetry { blocked: 0, running: 1 });
            }
            assert_eq!(ctx.depth(), depth);

            for _ in 0..depth {
                gate.exit(&mut ctx, "GetMap");
            }

            assert_eq!(journal.admits(), vec!["global"], "depth {depth}");
            assert_eq!(journal.releases(), vec!["global"], "depth {depth}");
            assert_eq!(gate.telemetry(), GateTelemetry::default());
        }
    }

    #[test]
    fn release_happens_only_at_the_outermost_exit() {
        let journal = Journal::new();
        let gate = recording_gate(&journal);
        let mut ctx = ExecutionContext::new();

        gate.enter(&mut ctx, "GetMap").unwrap();
        gate.enter(&mut ctx, "GetLegendGraphic").unwrap();
        gate.exit(&mut ctx, "GetLegendGraphic");
        assert!(journal.releases().is_empty());
        assert_eq!(gate.running(), 1);

        gate.exit(&mut ctx, "GetMap");
        assert_eq!(journal.releases(), vec!["global"]);
    }

    #[test]
    fn exit_without_enter_is_ignored() {
        let journal = Journal::new();
        let gate = recording_gate(&journal);
        let mut ctx = ExecutionContext::new();

        gate.exit(&mut ctx, "GetMap");
        assert_eq!(ctx.depth(), 0);
        assert!(journal.releases().is_empty());
        assert_eq!(gate.telemetry(), GateTelemetry::default());

        // a double exit after a balanced pair is ignored too
        gate.enter(&mut ctx, "GetMap").unwrap();
        gate.exit(&mut ctx, "GetMap");
        gate.exit(&mut ctx, "GetMap");
        assert_eq!(journal.releases(), vec!["global"]);
        assert_eq!(gate.running(), 0);
    }

    #[test]
    fn separate_contexts_are_admitted_separately() {
        let journal = Journal::new();
        let gate = recording_gate(&journal);
        let mut first = ExecutionContext::new();
        let mut second = ExecutionContext::new();

        gate.enter(&mut first, "GetMap").unwrap();
        gate.enter(&mut second, "GetMap").unwrap();
        assert_eq!(gate.running(), 2);
        assert_eq!(journal.admits().len(), 2);

        gate.exit(&mut first, "GetMap");
        gate.exit(&mut second, "GetMap");
        assert_eq!(journal.releases().len(), 2);
        assert_eq!(gate.running(), 0);
    }
}
