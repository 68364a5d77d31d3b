//! Scene objects from scene descriptions.
//!
//! Two schemas exist. Piece layout files (`<piece id type color>` with a
//! `start-field` and a `posture`) describe the board of one game. Tracked
//! object files come from the camera tracker; every `<object>` has three
//! positional children:
//!
//! ```text
//! <object id isLandmark isTarget>
//!   [0] position   @global @x @y
//!   [1] shape      @BestResponse
//!         [0] distribution @F .. @Z
//!         [1] orientation  @value
//!         [2] skewness     @horizontal @vertical
//!         [3] edges        @value
//!   [2] colour     @BestResponse
//!         [0] distribution @Blue ..
//!         [1] hsv          @H @S @V
//!         [2] rgb          @B @G @R
//! ```
//!
//! Values are copied verbatim.

use crate::diagnostics::{DiagnosticCode, DiagnosticLog};
use crate::ir::{GameId, SceneElement, SceneObject};

pub(crate) const SHAPE_LETTERS: [&str; 12] =
    ["F", "I", "L", "N", "P", "T", "U", "V", "W", "X", "Y", "Z"];

/// Colour distribution keys of the single-instructor tracker.
pub(crate) const COLOURS: [&str; 9] = [
    "Blue", "Brown", "Grey", "Green", "Orange", "Pink", "Purple", "Red", "Yellow",
];

/// Colour distribution keys of the two-speaker tracker, which also reports
/// the `Gray` spelling.
pub(crate) const COLOURS_WITH_GRAY: [&str; 10] = [
    "Blue", "Brown", "Grey", "Gray", "Green", "Orange", "Pink", "Purple", "Red", "Yellow",
];

const HSV: [&str; 3] = ["H", "S", "V"];
const RGB: [&str; 3] = ["B", "G", "R"];

/// One object of a piece layout file.
pub(crate) fn layout_piece(piece: &SceneElement, game_id: &GameId) -> SceneObject {
    let posture = piece.find("posture");
    SceneObject {
        game_id: Some(game_id.clone()),
        piece_id: attr(piece, "id"),
        shape: attr(piece, "type"),
        colour: attr(piece, "color"),
        grid_position: piece.find("start-field").and_then(|f| f.text.clone()),
        is_mirrored: posture.and_then(|p| attr(p, "isMirrored")),
        orientation: posture.and_then(|p| attr(p, "rotation")),
        ..SceneObject::default()
    }
}

/// Scene objects for the given tracked-object elements.
///
/// Objects that lack a required part are skipped and logged at `time`.
pub(crate) fn tracked_objects(
    objects: &[&SceneElement],
    colours: &[&str],
    game_id: Option<&GameId>,
    timestamp: Option<f64>,
    time: f64,
    log: &mut DiagnosticLog,
) -> Vec<SceneObject> {
    let mut out = Vec::with_capacity(objects.len());
    for object in objects {
        match tracked_object(object, colours) {
            Ok(mut scene) => {
                scene.game_id = game_id.cloned();
                scene.timestamp_id = timestamp;
                out.push(scene);
            }
            Err(reason) => log.at(
                time,
                DiagnosticCode::SceneObjectUnreadable,
                format!(
                    "Scene object \"{}\" could not be read: {reason}. It has been skipped.",
                    object.attr("id").unwrap_or("?")
                ),
            ),
        }
    }
    out
}

/// Reads one tracked object. The error names the missing part.
pub(crate) fn tracked_object(
    object: &SceneElement,
    colours: &[&str],
) -> Result<SceneObject, String> {
    let position = child(object, 0, "position")?;
    let shape = child(object, 1, "shape")?;
    let colour = child(object, 2, "colour")?;

    let shape_distribution = child(shape, 0, "shape distribution")?;
    let shape_orientation = child(shape, 1, "shape orientation")?;
    let skewness = child(shape, 2, "shape skewness")?;
    let edges = child(shape, 3, "shape edges")?;

    let colour_distribution = child(colour, 0, "colour distribution")?;
    let hsv = child(colour, 1, "colour hsv")?;
    let rgb = child(colour, 2, "colour rgb")?;

    Ok(SceneObject {
        piece_id: attr(object, "id"),
        is_landmark: attr(object, "isLandmark"),
        is_target: attr(object, "isTarget"),
        position_global: attr(position, "global"),
        position_x: attr(position, "x"),
        position_y: attr(position, "y"),
        shape: attr(shape, "BestResponse"),
        shape_distribution: Some(required_pairs(shape_distribution, &SHAPE_LETTERS)?),
        shape_orientation: attr(shape_orientation, "value"),
        shape_skewness_horizontal: attr(skewness, "horizontal"),
        shape_skewness_vertical: attr(skewness, "vertical"),
        shape_edges: attr(edges, "value"),
        colour: attr(colour, "BestResponse"),
        colour_distribution: Some(optional_pairs(colour_distribution, colours)),
        colour_hsv: Some(required_pairs(hsv, &HSV)?),
        colour_rgb: Some(required_pairs(rgb, &RGB)?),
        ..SceneObject::default()
    })
}

fn attr(element: &SceneElement, name: &str) -> Option<String> {
    element.attr(name).map(str::to_string)
}

fn child<'e>(
    element: &'e SceneElement,
    index: usize,
    what: &str,
) -> Result<&'e SceneElement, String> {
    element
        .child(index)
        .ok_or_else(|| format!("missing {what} element"))
}

/// `K:v,K:v,..` over `keys`; every key must be present.
fn required_pairs(element: &SceneElement, keys: &[&str]) -> Result<String, String> {
    let mut pairs = Vec::with_capacity(keys.len());
    for key in keys {
        let value = element
            .attr(key)
            .ok_or_else(|| format!("missing attribute {key} on <{}>", element.name))?;
        pairs.push(format!("{key}:{value}"));
    }
    Ok(pairs.join(","))
}

/// `K:v,K:v,..` over `keys`; a missing key renders as `None`.
fn optional_pairs(element: &SceneElement, keys: &[&str]) -> String {
    keys.iter()
        .map(|key| format!("{key}:{}", element.attr(key).unwrap_or("None")))
        .collect::<Vec<_>>()
        .join(",")
}
