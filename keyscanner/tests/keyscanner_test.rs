mod common;
pub(crate) use crate::common::*;

mod keyscanner_test {
    use heapless::Deque;
    use keyscanner::KeyScanner;
    use keyscanner::config::{ScanConfig, StateMachineConfig};
    use keyscanner::debounce::counter_debouncer::CounterDebouncer;
    use keyscanner::debounce::state_machine_debouncer::{KeyPhase, StateMachineDebouncer};
    use keyscanner::debounce::{DebounceState, DebouncerTrait, DefaultDebouncer};
    use keyscanner::matrix::StabilityScanner;
    use keyscanner::recorder::{RecordLayout, StateRecorder, from_row_major};
    use keyscanner::scheduler::ScanScheduler;

    use super::*;

    type TestScanner<'a, D> = KeyScanner<'a, StabilityScanner<FakeMatrix<4>, 4>, D, Deque<u8, 64>, 4>;

    fn create_scanner<D: DebouncerTrait>(debouncer: D, scheduler: &ScanScheduler) -> TestScanner<'_, D> {
        KeyScanner::new(
            StabilityScanner::new(FakeMatrix::default(), ScanConfig::DEFAULT),
            debouncer,
            StateRecorder::new(RecordLayout::Lines),
            Deque::new(),
            scheduler,
        )
    }

    /// Fire `n` ticks, return the 1-based ticks with a change
    fn run_ticks<D: DebouncerTrait>(
        scanner: &mut TestScanner<'_, D>,
        scheduler: &ScanScheduler,
        n: usize,
    ) -> Vec<(usize, u8)> {
        (1..=n)
            .filter_map(|tick| {
                scheduler.on_timer_tick();
                let changes = scanner.poll();
                (changes != 0).then_some((tick, changes))
            })
            .collect()
    }

    #[test]
    fn test_press_is_accepted_on_18th_tick() {
        let scheduler = ScanScheduler::new(ScanConfig::DEFAULT);
        let mut scanner = create_scanner(CounterDebouncer::new(TEST_COUNTER_CONFIG), &scheduler);

        assert!(run_ticks(&mut scanner, &scheduler, 20).is_empty());
        scanner.scanner().pins().set_key(2, 5, true);
        assert_eq!(run_ticks(&mut scanner, &scheduler, 20), vec![(18, 1 << 5)]);

        assert_eq!(scanner.lines()[2].stable(), 1 << 5);
        // Exactly one report was recorded
        assert_eq!(scanner.sink().iter().copied().collect::<Vec<_>>(), vec![0, 0, 1 << 5, 0]);
    }

    #[test]
    fn test_default_debouncer() {
        let scheduler = ScanScheduler::new(ScanConfig::DEFAULT);
        let mut scanner = create_scanner(DefaultDebouncer::default(), &scheduler);
        scanner.scanner().pins().set_key(3, 0, true);
        let changes = run_ticks(&mut scanner, &scheduler, 100);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].1, 0b1);
        assert_eq!(scanner.lines()[3].stable(), 0b1);
    }

    #[test]
    fn test_no_scan_without_tick() {
        let scheduler = ScanScheduler::new(ScanConfig::DEFAULT);
        let mut scanner = create_scanner(CounterDebouncer::new(TEST_COUNTER_CONFIG), &scheduler);
        // Pending at boot
        scanner.poll();
        let reads = scanner.scanner().pins().reads;
        assert!(reads > 0);

        for _ in 0..10 {
            assert_eq!(scanner.poll(), 0);
        }
        assert_eq!(scanner.scanner().pins().reads, reads);
    }

    #[test]
    fn test_missed_ticks_scan_once() {
        let scheduler = ScanScheduler::new(ScanConfig::DEFAULT);
        let mut scanner = create_scanner(CounterDebouncer::new(TEST_COUNTER_CONFIG), &scheduler);
        scanner.scanner().pins().set_key(0, 0, true);
        scanner.poll();
        assert_eq!(scanner.lines()[0].counter(0), 1);

        // The main loop was busy for 5 ticks
        for _ in 0..5 {
            scheduler.on_timer_tick();
        }
        scanner.poll();
        scanner.poll();
        assert_eq!(scanner.lines()[0].counter(0), 2);
    }

    #[test]
    fn test_press_and_release_reports() {
        let scheduler = ScanScheduler::new(ScanConfig::DEFAULT);
        let mut scanner = create_scanner(CounterDebouncer::new(TEST_COUNTER_CONFIG), &scheduler);

        scanner.scanner().pins().set_key(0, 1, true);
        scanner.scanner().pins().set_key(3, 7, true);
        assert_eq!(run_ticks(&mut scanner, &scheduler, 30), vec![(18, 0b1000_0010)]);
        scanner.scanner().pins().set_key(3, 7, false);
        assert_eq!(run_ticks(&mut scanner, &scheduler, 30), vec![(18, 0b1000_0000)]);

        assert_eq!(
            scanner.sink().iter().copied().collect::<Vec<_>>(),
            vec![0b10, 0, 0, 0b1000_0000, 0b10, 0, 0, 0]
        );
    }

    #[test]
    fn test_row_major_reports() {
        let scheduler = ScanScheduler::new(ScanConfig::DEFAULT);
        let mut scanner = KeyScanner::new(
            StabilityScanner::<_, 4>::new(FakeMatrix::default(), ScanConfig::DEFAULT),
            CounterDebouncer::new(TEST_COUNTER_CONFIG),
            StateRecorder::new(RecordLayout::RowMajor),
            Deque::<u8, 64>::new(),
            &scheduler,
        );

        scanner.scanner().pins().set_key(1, 6, true);
        run_ticks(&mut scanner, &scheduler, 18);

        let report: [u8; 4] = scanner.sink().iter().copied().collect::<Vec<_>>().try_into().unwrap();
        assert_eq!(from_row_major(&report), [0, 1 << 6, 0, 0]);
    }

    #[test]
    fn test_state_machine_debouncer_scan() {
        let scheduler = ScanScheduler::new(ScanConfig::DEFAULT);
        let mut scanner = create_scanner(StateMachineDebouncer::new(StateMachineConfig::DEFAULT), &scheduler);

        scanner.scanner().pins().set_key(1, 3, true);
        assert_eq!(run_ticks(&mut scanner, &scheduler, 2), vec![(2, 1 << 3)]);
        assert_eq!(scanner.lines()[1].phase(3), KeyPhase::LockedOn);

        // A one tick press is chatter
        scanner.scanner().pins().set_key(0, 0, true);
        run_ticks(&mut scanner, &scheduler, 1);
        scanner.scanner().pins().set_key(0, 0, false);
        assert!(run_ticks(&mut scanner, &scheduler, 1).is_empty());
        assert_eq!(scanner.lines()[0].phase(0), KeyPhase::Off);
        assert!(scanner.lines()[0].multiplier(0) > 1);
    }

    #[test]
    fn test_random_noise_never_flips_without_change() {
        let scheduler = ScanScheduler::new(ScanConfig::DEFAULT);
        let mut scanner = create_scanner(CounterDebouncer::new(TEST_COUNTER_CONFIG), &scheduler);
        let mut rng = Lcg::new(42);

        for _ in 0..2000 {
            let before: Vec<u8> = scanner.lines().iter().map(|line| line.stable()).collect();
            for line in 0..4 {
                // Sparse noise
                let noise = rng.next_u8() & rng.next_u8() & rng.next_u8();
                scanner.scanner().pins().keys[line] ^= noise;
            }
            scheduler.on_timer_tick();
            let changes = scanner.poll();

            let mut flipped = 0;
            for (line, state) in scanner.lines().iter().enumerate() {
                let diff = before[line] ^ state.stable();
                assert_eq!(diff, state.last_changes());
                flipped |= diff;
            }
            assert_eq!(flipped, changes);
            if scanner.sink().is_full() {
                scanner.sink().clear();
            }
        }
    }
}
