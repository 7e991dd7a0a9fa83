// Raw rgb24 frame files and input/output normalization.

#[cfg(test)]
mod tests {
    use std::fs::{self, File};
    use std::io::{BufReader, BufWriter, Cursor, Read, Write};

    use mp4archive_core::config::Configuration;
    use mp4archive_core::framing::{FrameError, RenderedFrame};
    use mp4archive_core::session::io::{open_input, open_output, read_exact_or_eof, HeadCapture};
    use mp4archive_core::session::{
        decode_stream, encode_stream, DecodeParams, EncodeParams, FrameSink, FrameSource,
        InputSource, MemoryFrames, OutputSink, ParallelismProfile, RawFrameReader, RawFrameWriter,
    };
    use mp4archive_core::types::ArchiveError;
    use tempfile::tempdir;

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 13 + 5) as u8).collect()
    }

    #[test]
    fn raw_frame_file_round_trip() {
        let dir = tempdir().unwrap();
        let input_path = dir.path().join("input.bin");
        let frames_path = dir.path().join("input.rgb");
        let output_path = dir.path().join("output.bin");

        let input = payload(1000);
        fs::write(&input_path, &input).unwrap();

        let c = Configuration::new(30, 5).unwrap();
        let params = EncodeParams::new(c)
            .with_metadata("input", "bin")
            .with_profile(ParallelismProfile::new(3, 4));

        let mut sink = RawFrameWriter::new(BufWriter::new(File::create(&frames_path).unwrap()));
        encode_stream(InputSource::File(input_path), &mut sink, &params).unwrap();
        let frames_written = sink.frames_written();
        drop(sink);

        // 1000 bytes over 75-byte grids: 14 data frames, plus metadata
        assert_eq!(frames_written, 15);
        let raw_len = fs::metadata(&frames_path).unwrap().len();
        assert_eq!(raw_len, 15 * 30 * 30 * 3);

        let source = RawFrameReader::new(BufReader::new(File::open(&frames_path).unwrap()), 30);
        let report = decode_stream(source, OutputSink::File(output_path.clone()), &DecodeParams::new(c, true)).unwrap();

        assert_eq!(report.file_name().as_deref(), Some("input.bin"));
        let decoded = fs::read(&output_path).unwrap();
        assert_eq!(decoded.len(), 14 * 75);
        assert_eq!(&decoded[..1000], &input[..]);
    }

    #[test]
    fn trailing_partial_frame_is_a_length_mismatch() {
        let frame = RenderedFrame::new(4);
        let mut raw = frame.as_bytes().to_vec();
        raw.extend_from_slice(&frame.as_bytes()[..10]);

        let mut reader = RawFrameReader::new(Cursor::new(raw), 4);
        assert!(reader.read_frame().unwrap().is_some());
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::Frame(FrameError::LengthMismatch { expected: 48, actual: 10 })
        ));
    }

    #[test]
    fn raw_writer_concatenates_frames() {
        let a = RenderedFrame::from_raw(1, vec![1, 2, 3]).unwrap();
        let b = RenderedFrame::from_raw(1, vec![4, 5, 6]).unwrap();

        let mut writer = RawFrameWriter::new(Vec::new());
        writer.write_frame(a).unwrap();
        writer.write_frame(b).unwrap();
        writer.finish().unwrap();

        assert_eq!(writer.frames_written(), 2);
        assert_eq!(writer.into_inner(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn memory_frames_are_fifo() {
        let mut frames = MemoryFrames::new();
        frames.write_frame(RenderedFrame::from_raw(1, vec![1, 1, 1]).unwrap()).unwrap();
        frames.write_frame(RenderedFrame::from_raw(1, vec![2, 2, 2]).unwrap()).unwrap();
        assert_eq!(frames.len(), 2);

        assert_eq!(frames.read_frame().unwrap().unwrap().as_bytes(), &[1, 1, 1]);
        assert_eq!(frames.read_frame().unwrap().unwrap().as_bytes(), &[2, 2, 2]);
        assert!(frames.read_frame().unwrap().is_none());
    }

    #[test]
    fn missing_input_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let err = open_input(InputSource::File(dir.path().join("nope"))).err().unwrap();
        assert!(matches!(err, ArchiveError::Io(_)));
    }

    #[test]
    fn memory_output_is_captured() {
        let (mut writer, buf) = open_output(OutputSink::Memory).unwrap();
        writer.write_all(b"abc").unwrap();
        drop(writer);
        assert_eq!(*buf.unwrap().lock().unwrap(), b"abc".to_vec());
    }

    #[test]
    fn read_exact_or_eof_stops_at_eof() {
        let mut r = open_input(InputSource::Memory(vec![7; 10])).unwrap();
        assert_eq!(read_exact_or_eof(&mut r, 6).unwrap().as_ref(), &[7; 6]);
        assert_eq!(read_exact_or_eof(&mut r, 6).unwrap().as_ref(), &[7; 4]);
        assert!(read_exact_or_eof(&mut r, 6).unwrap().is_empty());

        let mut rest = Vec::new();
        r.read_to_end(&mut rest).unwrap();
        assert!(rest.is_empty());
    }

    #[test]
    fn head_capture_keeps_only_the_prefix() {
        let mut w = HeadCapture::new(Vec::new(), 4);
        w.write_all(b"ab").unwrap();
        w.write_all(b"cdef").unwrap();
        assert_eq!(w.head(), b"abcd");

        let (inner, head) = w.into_parts();
        assert_eq!(inner, b"abcdef".to_vec());
        assert_eq!(head, b"abcd".to_vec());
    }
}
