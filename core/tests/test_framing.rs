// Frame codec: packing, block replication and sampling.

#[cfg(test)]
mod tests {
    use mp4archive_core::config::Configuration;
    use mp4archive_core::framing::{
        grid_count, pack, pack_grid, render, sample, unpack, DataGrid, FrameError, Pixel,
        RenderedFrame,
    };
    use proptest::prelude::*;

    #[test]
    fn five_bytes_fill_one_two_by_two_grid() {
        let c = Configuration::new(4, 2).unwrap();
        let grids: Vec<DataGrid> = pack(&[1, 2, 3, 4, 5], &c).collect();

        assert_eq!(grids.len(), 1);
        let expected = DataGrid::from_rows(&[
            vec![Pixel::new(1, 2, 3), Pixel::new(4, 5, 0)],
            vec![Pixel::BLACK, Pixel::BLACK],
        ])
        .unwrap();
        assert_eq!(grids[0], expected);

        let bytes = unpack(grids, &c).unwrap();
        assert_eq!(bytes, vec![1, 2, 3, 4, 5, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn empty_input_yields_no_grids() {
        let c = Configuration::new(4, 2).unwrap();
        assert_eq!(pack(&[], &c).count(), 0);
        assert_eq!(unpack(Vec::new(), &c).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn oversized_chunk_is_rejected() {
        let c = Configuration::new(4, 2).unwrap();
        assert_eq!(
            pack_grid(&[0u8; 13], &c),
            Err(FrameError::ChunkTooLarge { len: 13, capacity: 12 })
        );
    }

    #[test]
    fn render_replicates_each_cell_into_a_block() {
        let c = Configuration::new(6, 2).unwrap();
        let grid = pack_grid(&[10, 20, 30, 40, 50, 60, 70, 80, 90], &c).unwrap();
        let frame = render(&grid, &c).unwrap();

        assert_eq!(frame.size(), 6);
        assert_eq!(frame.as_bytes().len(), 6 * 6 * 3);
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(frame.pixel(x, y), Some(Pixel::new(10, 20, 30)));
                assert_eq!(frame.pixel(x + 3, y), Some(Pixel::new(40, 50, 60)));
                assert_eq!(frame.pixel(x, y + 3), Some(Pixel::new(70, 80, 90)));
                assert_eq!(frame.pixel(x + 3, y + 3), Some(Pixel::BLACK));
            }
        }
        assert!(frame.is_block_homogeneous(2));
    }

    #[test]
    fn render_rejects_grid_of_other_geometry() {
        let c = Configuration::new(6, 2).unwrap();
        let grid = DataGrid::new(3);
        assert_eq!(
            render(&grid, &c).map(|_| ()),
            Err(FrameError::GridMismatch { expected: 2, actual: 3 })
        );
    }

    #[test]
    fn sample_rejects_wrong_frame_size() {
        let c = Configuration::new(6, 2).unwrap();
        let frame = RenderedFrame::new(8);
        assert_eq!(
            sample(&frame, &c),
            Err(FrameError::SizeMismatch { expected: 6, actual: 8 })
        );
    }

    #[test]
    fn from_raw_checks_length() {
        assert_eq!(
            RenderedFrame::from_raw(2, vec![0; 11]).map(|_| ()),
            Err(FrameError::LengthMismatch { expected: 12, actual: 11 })
        );
    }

    #[test]
    fn disturbed_block_is_not_homogeneous() {
        let c = Configuration::new(6, 2).unwrap();
        let grid = pack_grid(&[1; 12], &c).unwrap();
        let mut frame = render(&grid, &c).unwrap();
        frame.put_pixel(4, 5, Pixel::new(9, 9, 9)).unwrap();

        assert!(!frame.is_block_homogeneous(2));
        // sampling only reads top-left pixels, so it is unaffected
        assert_eq!(sample(&frame, &c).unwrap(), grid);
    }

    #[test]
    fn u24_is_big_endian() {
        let px = Pixel::from_u24(0x45_4C_45);
        assert_eq!(px, Pixel::new(0x45, 0x4C, 0x45));
        assert_eq!(px.to_u24(), 0x45_4C_45);
    }

    fn geometry() -> impl Strategy<Value = Configuration> {
        prop::sample::select(vec![(2u32, 1u32), (4, 2), (6, 3), (12, 4), (10, 5)])
            .prop_map(|(size, d)| Configuration::new(size, d).unwrap())
    }

    proptest! {
        #[test]
        fn prop_unpack_restores_input_plus_zero_padding(
            c in geometry(),
            bytes in prop::collection::vec(any::<u8>(), 0..400),
        ) {
            let grids: Vec<DataGrid> = pack(&bytes, &c).collect();
            prop_assert_eq!(grids.len(), grid_count(bytes.len(), &c));

            let out = unpack(grids, &c).unwrap();
            prop_assert!(out.len() >= bytes.len());
            prop_assert!(out.len() - bytes.len() < c.grid_capacity());
            prop_assert_eq!(&out[..bytes.len()], &bytes[..]);
            prop_assert!(out[bytes.len()..].iter().all(|&b| b == 0));
            if bytes.len() % c.grid_capacity() == 0 {
                prop_assert_eq!(out.len(), bytes.len());
            }
        }

        #[test]
        fn prop_sample_inverts_render(
            c in geometry(),
            chunk in prop::collection::vec(any::<u8>(), 1..=12),
        ) {
            let chunk = &chunk[..chunk.len().min(c.grid_capacity())];
            let grid = pack_grid(chunk, &c).unwrap();
            let frame = render(&grid, &c).unwrap();
            prop_assert!(frame.is_block_homogeneous(c.divisions()));
            prop_assert_eq!(sample(&frame, &c).unwrap(), grid);
        }
    }
}
