//! Live value evaluation.
//!
//! Follows what the rendering surface would do with a property: `var()`
//! chains are dereferenced through the registry and `color-mix()` is
//! composited with [`Color::blend_over`]. The watcher uses this to measure
//! what is actually on screen, user overrides included.

use n_color::Color;
use n_token::{Opacity, PropertyName, PropertyValue};

use crate::registry::StyleRegistry;

/// Longest `var()` chain followed before giving up. Cycles end here too.
pub const MAX_EVAL_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("{0} is not set")]
    Missing(PropertyName),

    #[error("{name} is not a color: {value:?}")]
    NotAColor { name: PropertyName, value: String },

    #[error("{name} is not a number: {value:?}")]
    NotANumber { name: PropertyName, value: String },

    #[error("reference chain through {0} is too deep")]
    TooDeep(PropertyName),
}

/// The concrete color `name` renders as.
///
/// # Errors
///
/// See [`EvalError`].
pub fn eval_color<R: StyleRegistry + ?Sized>(registry: &R, name: &PropertyName) -> Result<Color, EvalError> {
    color_at(registry, name, 0)
}

/// The concrete number `name` renders as. A `px` suffix is dropped.
///
/// # Errors
///
/// See [`EvalError`].
pub fn eval_number<R: StyleRegistry + ?Sized>(registry: &R, name: &PropertyName) -> Result<f64, EvalError> {
    number_at(registry, name, 0)
}

/// The color a not-yet-written value would render as under `name`.
///
/// # Errors
///
/// See [`EvalError`].
pub fn eval_value<R: StyleRegistry + ?Sized>(
    registry: &R,
    name: &PropertyName,
    value: &PropertyValue,
) -> Result<Color, EvalError> {
    color_of(registry, name, value, 0)
}

fn color_at<R: StyleRegistry + ?Sized>(registry: &R, name: &PropertyName, depth: usize) -> Result<Color, EvalError> {
    if depth > MAX_EVAL_DEPTH {
        return Err(EvalError::TooDeep(name.clone()));
    }
    let text = registry.get(name).ok_or_else(|| EvalError::Missing(name.clone()))?;
    color_of(registry, name, &PropertyValue::parse(&text), depth)
}

fn color_of<R: StyleRegistry + ?Sized>(
    registry: &R,
    name: &PropertyName,
    value: &PropertyValue,
    depth: usize,
) -> Result<Color, EvalError> {
    match value {
        PropertyValue::Literal(text) => Color::hex(text).ok_or_else(|| EvalError::NotAColor {
            name: name.clone(),
            value: text.clone(),
        }),
        PropertyValue::Ref(target) => color_at(registry, target, depth + 1),
        PropertyValue::Blend { fg, bg, opacity } => {
            let fg = color_at(registry, fg, depth + 1)?;
            let bg = color_at(registry, bg, depth + 1)?;
            let opacity = match opacity {
                Opacity::Ref(op) => number_at(registry, op, depth + 1)?,
                Opacity::Percent(p) => p / 100.0,
            };
            Ok(fg.blend_over(bg, opacity))
        }
    }
}

fn number_at<R: StyleRegistry + ?Sized>(registry: &R, name: &PropertyName, depth: usize) -> Result<f64, EvalError> {
    if depth > MAX_EVAL_DEPTH {
        return Err(EvalError::TooDeep(name.clone()));
    }
    let text = registry.get(name).ok_or_else(|| EvalError::Missing(name.clone()))?;
    match PropertyValue::parse(&text) {
        PropertyValue::Ref(target) => number_at(registry, &target, depth + 1),
        PropertyValue::Literal(literal) => parse_number(&literal).ok_or(EvalError::NotANumber {
            name: name.clone(),
            value: literal,
        }),
        PropertyValue::Blend { .. } => Err(EvalError::NotANumber {
            name: name.clone(),
            value: text,
        }),
    }
}

fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    text.strip_suffix("px").unwrap_or(text).trim().parse().ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
