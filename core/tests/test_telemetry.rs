// Session telemetry: counters, stage timers and snapshots.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mp4archive_core::config::Configuration;
    use mp4archive_core::session::{
        decode_stream, encode_stream, DecodeParams, EncodeParams, InputSource, MemoryFrames,
        OutputSink, ParallelismProfile,
    };
    use mp4archive_core::telemetry::{Stage, StageTimes, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};

    #[test]
    fn encode_snapshot_accounts_for_every_byte() {
        let c = Configuration::new(12, 4).unwrap();
        let params = EncodeParams::new(c)
            .with_metadata("t", "bin")
            .with_profile(ParallelismProfile::new(2, 2));

        let mut frames = MemoryFrames::new();
        let snap = encode_stream(InputSource::Memory(vec![9; 100]), &mut frames, &params).unwrap();

        assert_eq!(snap.frames_metadata, 1);
        assert_eq!(snap.frames_data, 3);
        assert_eq!(snap.frames_total(), frames.len() as u64);
        assert_eq!(snap.bytes_payload, 100);
        assert_eq!(snap.bytes_padding, 3 * 48 - 100);
        assert_eq!(snap.bytes_raster, 4 * 12 * 12 * 3);
        assert!((snap.padding_ratio - 44.0 / 144.0).abs() < 1e-9);
        assert!(snap.has_all_stages(&[Stage::Pack, Stage::Render, Stage::Write]));
    }

    #[test]
    fn decode_snapshot_counts_frames() {
        let c = Configuration::new(12, 4).unwrap();
        let params = EncodeParams::new(c).with_profile(ParallelismProfile::single_threaded());
        let mut frames = MemoryFrames::new();
        encode_stream(InputSource::Memory(vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13]), &mut frames, &params).unwrap();

        let report = decode_stream(frames, OutputSink::Memory, &DecodeParams::new(c, false)).unwrap();
        let snap = &report.telemetry;
        assert_eq!(snap.frames_metadata, 0);
        assert_eq!(snap.frames_data, 1);
        assert_eq!(snap.bytes_payload, 48);
        assert_eq!(snap.ambiguous_runs, 0);
        assert!(snap.has_all_stages(&[Stage::Detect, Stage::Sample]));
    }

    #[test]
    fn counters_merge() {
        let mut a = TelemetryCounters::default();
        a.add_data(10, 2, 48);
        let mut b = TelemetryCounters::default();
        b.add_metadata(48);
        b.add_ambiguous_runs(2);

        a += b;
        assert_eq!(a.frames_total(), 2);
        assert_eq!(a.bytes_raster, 96);
        assert_eq!(a.ambiguous_runs, 2);
    }

    #[test]
    fn stage_times_accumulate() {
        let mut t = StageTimes::default();
        t.add(Stage::Read, Duration::from_millis(2));
        t.add(Stage::Read, Duration::from_millis(3));
        t.add(Stage::Render, Duration::from_millis(1));

        assert_eq!(t.get(Stage::Read), Duration::from_millis(5));
        assert_eq!(t.total(), Duration::from_millis(6));
        assert!(!t.has_all(&[Stage::Read, Stage::Unpack]));
        assert!(t.summary().contains("read=5.000ms"));
    }

    #[test]
    fn snapshot_serializes() {
        let mut counters = TelemetryCounters::default();
        counters.add_data(5, 7, 48);
        let mut timer = TelemetryTimer::new();
        timer.add_stage_time(Stage::Pack, Duration::from_micros(10));
        timer.finish();

        let snap = TelemetrySnapshot::from(&counters, &timer);
        let json = serde_json::to_string(&snap).unwrap();
        let back: TelemetrySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.bytes_padding, 7);
        assert_eq!(back.stage_times.get(Stage::Pack), Duration::from_micros(10));
    }
}
