use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        RibError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        RibError::structural("x")
            .to_string()
            .contains("structural error:")
    );
    assert!(
        RibError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    assert!(
        RibError::missing_data("Cube", "Col")
            .to_string()
            .contains("missing data 'Col' on 'Cube'")
    );
}

#[test]
fn subprocess_errors_carry_path_and_code() {
    let err = RibError::Optimization {
        source_path: PathBuf::from("tex/wood.png"),
        exit_code: Some(3),
    };
    let msg = err.to_string();
    assert!(msg.contains("tex/wood.png"));
    assert!(msg.contains("exit code 3"));

    let err = RibError::Compilation {
        shader: PathBuf::from("shaders/plastic.sl"),
        exit_code: None,
    };
    assert!(err.to_string().contains("no exit code"));
}

#[test]
fn frame_fatal_classification() {
    assert!(RibError::structural("x").is_frame_fatal());
    assert!(
        RibError::MotionTopology {
            entity: "a".to_owned(),
            expected: 3,
            found: 4,
        }
        .is_frame_fatal()
    );
    assert!(!RibError::missing_data("a", "b").is_frame_fatal());
    assert!(!RibError::path_resolution("a", "b").is_frame_fatal());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = RibError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
