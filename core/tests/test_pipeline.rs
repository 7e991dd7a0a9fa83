// Worker pool ordering, the ordered writer and the render worker.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use crossbeam::channel::unbounded;

    use mp4archive_core::config::Configuration;
    use mp4archive_core::framing::{pack_grid, render, RenderedFrame};
    use mp4archive_core::session::frame_worker::{RenderJob, RenderWorker, WorkerError};
    use mp4archive_core::session::io::OrderedFrameWriter;
    use mp4archive_core::session::{encode_stream, EncodeParams, InputSource, ParallelismProfile};
    use mp4archive_core::types::ArchiveError;

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 131 + 17) as u8).collect()
    }

    fn encode_with(profile: ParallelismProfile, input: &[u8]) -> Vec<RenderedFrame> {
        let params = EncodeParams::new(Configuration::new(12, 4).unwrap())
            .with_metadata("order", "bin")
            .with_profile(profile);
        let mut frames = Vec::new();
        encode_stream(InputSource::Memory(input.to_vec()), &mut frames, &params).unwrap();
        frames
    }

    #[test]
    fn parallel_encode_matches_single_worker_encode() {
        let input = payload(48 * 37 + 5);

        let single = encode_with(ParallelismProfile::single_threaded(), &input);
        let parallel = encode_with(ParallelismProfile::new(8, 2), &input);
        let wide = encode_with(ParallelismProfile::new(4, 64), &input);

        assert_eq!(single.len(), 1 + 38);
        assert_eq!(parallel, single);
        assert_eq!(wide, single);
    }

    #[test]
    fn frames_follow_input_order() {
        let c = Configuration::new(12, 4).unwrap();
        let input = payload(48 * 9);
        let params = EncodeParams::new(c).with_profile(ParallelismProfile::new(6, 3));

        let mut frames = Vec::new();
        encode_stream(InputSource::Memory(input.clone()), &mut frames, &params).unwrap();

        assert_eq!(frames.len(), 9);
        for (frame, chunk) in frames.iter().zip(input.chunks(48)) {
            let expected = render(&pack_grid(chunk, &c).unwrap(), &c).unwrap();
            assert_eq!(frame, &expected);
        }
    }

    #[test]
    fn zero_workers_is_rejected() {
        let params = EncodeParams::new(Configuration::new(12, 4).unwrap())
            .with_profile(ParallelismProfile::new(0, 4));
        let mut frames = Vec::new();
        let err = encode_stream(InputSource::Memory(vec![1, 2, 3]), &mut frames, &params).unwrap_err();
        assert!(matches!(err, ArchiveError::Validation(_)));
        assert!(frames.is_empty());
    }

    #[test]
    fn dynamic_profile_is_usable() {
        let profile = ParallelismProfile::dynamic(12 * 12 * 3, 0.25, 16);
        assert!(profile.validate().is_ok());
        assert!(profile.inflight_frames <= 16);
    }

    fn frame(tag: u8) -> RenderedFrame {
        RenderedFrame::from_raw(1, vec![tag, tag, tag]).unwrap()
    }

    #[test]
    fn ordered_writer_reorders() {
        let mut sink: Vec<RenderedFrame> = Vec::new();
        {
            let mut writer = OrderedFrameWriter::new(&mut sink);
            writer.push(2, frame(2)).unwrap();
            writer.push(0, frame(0)).unwrap();
            assert_eq!(writer.written(), 1);
            writer.push(1, frame(1)).unwrap();
            writer.finish(3).unwrap();
        }
        assert_eq!(sink, vec![frame(0), frame(1), frame(2)]);
    }

    #[test]
    fn ordered_writer_holds_frames_behind_a_late_index() {
        let mut sink: Vec<RenderedFrame> = Vec::new();
        {
            let mut writer = OrderedFrameWriter::new(&mut sink);
            for i in (1..6u8).rev() {
                writer.push(u64::from(i), frame(i)).unwrap();
            }
            assert_eq!(writer.pending(), 5);
            assert_eq!(writer.written(), 0);

            writer.push(0, frame(0)).unwrap();
            assert_eq!(writer.pending(), 0);
            writer.finish(6).unwrap();
        }
        assert_eq!(sink, (0..6u8).map(frame).collect::<Vec<_>>());
    }

    #[test]
    fn ordered_writer_detects_gaps_and_duplicates() {
        let mut sink: Vec<RenderedFrame> = Vec::new();
        let mut writer = OrderedFrameWriter::new(&mut sink);
        writer.push(0, frame(0)).unwrap();
        assert!(matches!(writer.push(0, frame(0)), Err(ArchiveError::Validation(_))));

        writer.push(2, frame(2)).unwrap();
        assert!(matches!(writer.finish(3), Err(ArchiveError::Validation(_))));
    }

    #[test]
    fn render_worker_rejects_oversized_chunk() {
        let worker = RenderWorker::new(Configuration::new(4, 2).unwrap());
        let err = worker.render_job(RenderJob::new(3, Bytes::from(vec![0u8; 13]))).unwrap_err();
        assert!(matches!(err, WorkerError::InvalidJob { index: 3, .. }));
    }

    #[test]
    fn render_worker_counts_padding() {
        let worker = RenderWorker::new(Configuration::new(4, 2).unwrap());
        let out = worker.render_job(RenderJob::new(0, Bytes::from_static(&[1, 2, 3, 4, 5]))).unwrap();

        assert_eq!(out.index, 0);
        assert_eq!(out.counters.frames_data, 1);
        assert_eq!(out.counters.bytes_payload, 5);
        assert_eq!(out.counters.bytes_padding, 7);
        assert_eq!(out.counters.bytes_raster, 4 * 4 * 3);
    }

    #[test]
    fn render_worker_loop_forwards_results_until_channel_closes() {
        let worker = RenderWorker::new(Configuration::new(4, 2).unwrap());
        let (job_tx, job_rx) = unbounded();
        let (out_tx, out_rx) = unbounded();

        for i in 0..3u64 {
            job_tx.send(RenderJob::new(i, Bytes::from(vec![i as u8; 12]))).unwrap();
        }
        drop(job_tx);

        worker.run(job_rx, out_tx);
        let indices: Vec<u64> = out_rx.iter().map(|r| r.unwrap().index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }
}
