use super::*;

fn text(w: RibWriter<Vec<u8>>) -> String {
    String::from_utf8(w.finish().unwrap()).unwrap()
}

#[test]
fn nested_blocks_are_indented_and_balanced() {
    let mut w = RibWriter::new(Vec::new());
    w.open_block(BlockKind::Frame, &[RibArg::Int(1)]).unwrap();
    w.open_block(BlockKind::World, &[]).unwrap();
    w.open_block(BlockKind::Attribute, &[]).unwrap();
    let mut p = ParamList::new();
    p.string(None, "name", "Cube");
    w.write_attribute("identifier", &p).unwrap();
    w.close_block(BlockKind::Attribute).unwrap();
    w.close_block(BlockKind::World).unwrap();
    w.close_block(BlockKind::Frame).unwrap();
    assert_eq!(
        text(w),
        "FrameBegin 1\n  WorldBegin\n    AttributeBegin\n      \
         Attribute \"identifier\" \"string name\" [\"Cube\"]\n    AttributeEnd\n  WorldEnd\nFrameEnd\n"
    );
}

#[test]
fn mismatched_close_is_structural() {
    let mut w = RibWriter::new(Vec::new());
    w.open_block(BlockKind::Attribute, &[]).unwrap();
    let err = w.close_block(BlockKind::Transform).unwrap_err();
    assert!(matches!(err, RibError::Structural(_)));
}

#[test]
fn close_on_empty_stack_is_structural() {
    let mut w = RibWriter::new(Vec::new());
    assert!(matches!(
        w.close_block(BlockKind::World),
        Err(RibError::Structural(_))
    ));
}

#[test]
fn unclosed_block_at_finish_is_structural() {
    let mut w = RibWriter::new(Vec::new());
    w.open_block(BlockKind::Frame, &[RibArg::Int(1)]).unwrap();
    w.open_block(BlockKind::World, &[]).unwrap();
    let err = w.finish().err().unwrap();
    assert!(err.to_string().contains("2 block(s) left open"));
}

#[test]
fn every_interleaving_of_proper_nesting_is_accepted() {
    // Balanced sequences of depth up to 3 over two kinds never error.
    let kinds = [BlockKind::Attribute, BlockKind::Transform];
    for a in kinds {
        for b in kinds {
            for c in kinds {
                let mut w = RibWriter::new(Vec::new());
                w.open_block(a, &[]).unwrap();
                w.open_block(b, &[]).unwrap();
                w.close_block(b).unwrap();
                w.open_block(c, &[]).unwrap();
                w.close_block(c).unwrap();
                w.close_block(a).unwrap();
                assert!(w.finish().is_ok());
            }
        }
    }
}

#[test]
fn motion_with_two_samples_wraps_once() {
    let mut w = RibWriter::new(Vec::new());
    w.write_motion(&[0.0, 0.5], |w, i| {
        w.write_leaf(
            "Translate",
            &[RibArg::Float(i as f64), RibArg::Float(0.0), RibArg::Float(0.0)],
            &ParamList::new(),
        )
    })
    .unwrap();
    let out = text(w);
    assert_eq!(
        out,
        "MotionBegin [0 0.5]\n  Translate 0 0 0\n  Translate 1 0 0\nMotionEnd\n"
    );
    assert_eq!(out.matches("MotionBegin").count(), 1);
}

#[test]
fn single_sample_has_no_wrapper() {
    let mut w = RibWriter::new(Vec::new());
    w.write_motion(&[0.0], |w, _| {
        w.write_leaf("Sphere", &[RibArg::Float(1.0)], &ParamList::new())
    })
    .unwrap();
    assert_eq!(text(w), "Sphere 1\n");
}

#[test]
fn motion_requires_exactly_one_request_per_sample() {
    let mut w = RibWriter::new(Vec::new());
    let err = w
        .write_motion(&[0.0, 1.0], |w, _| {
            w.write_leaf("Translate", &[], &ParamList::new())?;
            w.write_leaf("Rotate", &[], &ParamList::new())
        })
        .unwrap_err();
    assert!(matches!(err, RibError::Structural(_)));

    let mut w = RibWriter::new(Vec::new());
    let err = w.write_motion(&[0.0, 1.0], |_, _| Ok(())).unwrap_err();
    assert!(err.to_string().contains("wrote 0 requests"));
}

#[test]
fn motion_times_must_ascend() {
    let mut w = RibWriter::new(Vec::new());
    let err = w
        .write_motion(&[0.5, 0.0], |w, _| {
            w.write_leaf("Translate", &[], &ParamList::new())
        })
        .unwrap_err();
    assert!(matches!(err, RibError::Structural(_)));
    assert!(w.write_motion(&[], |_, _| Ok(())).is_err());
}

#[test]
fn blocks_and_attributes_are_rejected_inside_motion() {
    let mut w = RibWriter::new(Vec::new());
    let err = w
        .write_motion(&[0.0, 1.0], |w, _| w.open_block(BlockKind::Attribute, &[]))
        .unwrap_err();
    assert!(matches!(err, RibError::Structural(_)));

    let mut w = RibWriter::new(Vec::new());
    assert!(w.open_block(BlockKind::Motion, &[]).is_err());
}
