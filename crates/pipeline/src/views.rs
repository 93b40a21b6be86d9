//! Labeling of multiview stage outputs.
//!
//! The multiview workflow saves its preview image first and the three
//! view renders last, so the last three output references in document
//! order correspond to front, back, and left. The count is validated
//! rather than assumed; fewer than three outputs is an error, never a
//! silent mislabel.

use mvforge_comfy::OutputReference;
use mvforge_core::ViewAngle;

/// Errors from view labeling.
#[derive(Debug, thiserror::Error)]
pub enum ViewLabelError {
    /// The stage produced fewer output files than there are views.
    #[error("Expected at least {expected} multiview outputs, found {found}")]
    NotEnoughOutputs { expected: usize, found: usize },
}

/// Pair the last three output references with front/back/left.
pub fn label_views(
    outputs: &[OutputReference],
) -> Result<Vec<(ViewAngle, OutputReference)>, ViewLabelError> {
    let expected = ViewAngle::ALL.len();
    if outputs.len() < expected {
        return Err(ViewLabelError::NotEnoughOutputs {
            expected,
            found: outputs.len(),
        });
    }

    let tail = &outputs[outputs.len() - expected..];
    Ok(ViewAngle::ALL
        .iter()
        .zip(tail)
        .map(|(view, reference)| (*view, reference.clone()))
        .collect())
}

/// Derive a view-labeled file name from a queue-generated one.
///
/// Queue output names end in `_.png` (`ComfyUI_00012_.png`); the label
/// slots in before the extension: `ComfyUI_00012_front.png`. Names
/// without that suffix get `_front` appended before their extension.
pub fn view_filename(original: &str, view: ViewAngle) -> String {
    if let Some(stem) = original.strip_suffix("_.png") {
        return format!("{stem}_{view}.png");
    }
    match original.rsplit_once('.') {
        Some((stem, extension)) => format!("{stem}_{view}.{extension}"),
        None => format!("{original}_{view}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn reference(filename: &str) -> OutputReference {
        OutputReference {
            node: "12".to_string(),
            filename: filename.to_string(),
            subfolder: None,
            url: format!("http://host/images/{filename}"),
        }
    }

    #[test]
    fn labels_last_three_in_order() {
        let outputs = vec![
            reference("preview.png"),
            reference("a.png"),
            reference("b.png"),
            reference("c.png"),
        ];
        let labeled = label_views(&outputs).unwrap();
        assert_eq!(labeled[0].0, ViewAngle::Front);
        assert_eq!(labeled[0].1.filename, "a.png");
        assert_eq!(labeled[1].0, ViewAngle::Back);
        assert_eq!(labeled[1].1.filename, "b.png");
        assert_eq!(labeled[2].0, ViewAngle::Left);
        assert_eq!(labeled[2].1.filename, "c.png");
    }

    #[test]
    fn exactly_three_outputs_are_all_labeled() {
        let outputs = vec![reference("a.png"), reference("b.png"), reference("c.png")];
        let labeled = label_views(&outputs).unwrap();
        assert_eq!(labeled.len(), 3);
    }

    #[test]
    fn too_few_outputs_is_an_error() {
        let outputs = vec![reference("a.png"), reference("b.png")];
        let error = label_views(&outputs).unwrap_err();
        assert_matches!(
            error,
            ViewLabelError::NotEnoughOutputs {
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn queue_suffix_is_replaced_by_label() {
        assert_eq!(
            view_filename("ComfyUI_00012_.png", ViewAngle::Front),
            "ComfyUI_00012_front.png"
        );
    }

    #[test]
    fn plain_names_get_label_before_extension() {
        assert_eq!(
            view_filename("render.png", ViewAngle::Back),
            "render_back.png"
        );
    }

    #[test]
    fn extensionless_names_get_label_appended() {
        assert_eq!(view_filename("render", ViewAngle::Left), "render_left");
    }
}
