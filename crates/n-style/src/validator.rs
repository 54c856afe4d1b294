//! Boundary validation for writes into the registry.
//!
//! | Tier    | Accepted                                                        |
//! |---------|-----------------------------------------------------------------|
//! | tokens  | anything                                                        |
//! | brand   | `var()` of a token property, or `color-mix()` of token operands |
//! | ui      | `var()` of a brand or token property, or such a `color-mix()`   |
//! | foreign | anything                                                        |
//!
//! A literal in the brand or UI tier gets one repair attempt: the token
//! index is searched for a token holding exactly that value, and the write
//! becomes a reference to it. A `color-mix()` with a fixed `NN%` weight is
//! treated the same way: the weight must match an opacity token and is
//! rewritten to read it. Token-tier operands must name a token the index
//! holds. Anything else is a [`ValidationError`].

use n_color::Color;
use n_token::{Opacity, PropertyName, PropertyValue, Tier, TokenIndex};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{name}: literal {value:?} matches no token")]
    UnmatchedLiteral { name: PropertyName, value: String },

    #[error("{name}: {target} is outside the tiers it may reference")]
    ForbiddenReference { name: PropertyName, target: PropertyName },

    #[error("{name}: {target} names no token")]
    UnknownTarget { name: PropertyName, target: PropertyName },
}

impl ValidationError {
    #[must_use]
    pub const fn name(&self) -> &PropertyName {
        match self {
            Self::UnmatchedLiteral { name, .. }
            | Self::ForbiddenReference { name, .. }
            | Self::UnknownTarget { name, .. } => name,
        }
    }
}

/// Outcome of a successful validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Write the value as given.
    Accept(PropertyValue),
    /// The literal `from` was replaced by a token reference.
    Repaired { from: String, to: PropertyValue },
}

impl Verdict {
    /// The value to write.
    #[must_use]
    pub const fn value(&self) -> &PropertyValue {
        match self {
            Self::Accept(value) | Self::Repaired { to: value, .. } => value,
        }
    }
}

/// Check `value` against the rules for `name`'s tier.
///
/// # Errors
///
/// [`ValidationError::UnmatchedLiteral`] for an irreparable literal or blend
/// weight, [`ValidationError::ForbiddenReference`] for an operand in the wrong
/// tier, and [`ValidationError::UnknownTarget`] for a token-tier operand the
/// index doesn't hold.
pub fn validate(
    name: &PropertyName,
    value: PropertyValue,
    index: &TokenIndex,
) -> Result<Verdict, ValidationError> {
    let allowed: &[Tier] = match name.tier() {
        Tier::Tokens | Tier::Foreign => return Ok(Verdict::Accept(value)),
        Tier::Brand => &[Tier::Tokens],
        Tier::Ui => &[Tier::Brand, Tier::Tokens],
    };

    match value {
        PropertyValue::Literal(text) => match repair(&text, index) {
            Some(to) => {
                tracing::debug!(%name, from = %text, to = %to, "literal repaired");
                Ok(Verdict::Repaired { from: text, to })
            }
            None => Err(ValidationError::UnmatchedLiteral {
                name: name.clone(),
                value: text,
            }),
        },
        value => {
            let opacity = match &value {
                PropertyValue::Blend { opacity: Opacity::Ref(op), .. } if op.tier() != Tier::Tokens => Some(op),
                _ => None,
            };
            // Opacity operands always come from the token tier.
            let forbidden = value
                .references()
                .into_iter()
                .find(|target| !allowed.contains(&target.tier()))
                .or(opacity);
            if let Some(target) = forbidden {
                return Err(ValidationError::ForbiddenReference {
                    name: name.clone(),
                    target: target.clone(),
                });
            }
            let unknown = value
                .references()
                .into_iter()
                .find(|target| target.tier() == Tier::Tokens && index.path_of(target).is_none());
            if let Some(target) = unknown {
                return Err(ValidationError::UnknownTarget {
                    name: name.clone(),
                    target: target.clone(),
                });
            }
            if let PropertyValue::Blend { fg, bg, opacity: Opacity::Percent(percent) } = &value {
                let from = value.render();
                let Some(path) = index.find_number(percent / 100.0, false) else {
                    return Err(ValidationError::UnmatchedLiteral {
                        name: name.clone(),
                        value: from,
                    });
                };
                let to = PropertyValue::Blend {
                    fg: fg.clone(),
                    bg: bg.clone(),
                    opacity: Opacity::Ref(PropertyName::token(path)),
                };
                tracing::debug!(%name, %from, to = %to, "blend weight repaired");
                return Ok(Verdict::Repaired { from, to });
            }
            Ok(Verdict::Accept(value))
        }
    }
}

/// Reverse-lookup a literal: colors by exact value, `Npx` among dimension
/// tokens, bare numbers among unit-less ones.
fn repair(text: &str, index: &TokenIndex) -> Option<PropertyValue> {
    let text = text.trim();
    let path = if let Some(color) = Color::hex(text) {
        index.find_color(color)
    } else if let Some(px) = text.strip_suffix("px") {
        index.find_number(px.trim().parse().ok()?, true)
    } else {
        index.find_number(text.parse().ok()?, false)
    }?;
    Some(PropertyValue::Ref(PropertyName::token(path)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use n_token::Document;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn name(s: &str) -> PropertyName {
        PropertyName::new(s)
    }

    fn index() -> TokenIndex {
        let doc = Document::from_value(
            "tokens",
            json!({
                "color": { "gray": {
                    "000": { "$value": "#ffffff" },
                    "900": { "$value": "#000000" }
                } },
                "size": { "md": { "$value": "16px" } },
                "opacity": { "high": { "$value": 0.87 } }
            }),
        )
        .unwrap();
        TokenIndex::from_document(&doc)
    }

    fn token_ref(s: &str) -> PropertyValue {
        PropertyValue::Ref(name(s))
    }

    #[test]
    fn token_tier_accepts_literals() {
        let verdict = validate(&name("--tokens-color-gray-000"), PropertyValue::literal("#ffffff"), &index());
        assert_eq!(verdict, Ok(Verdict::Accept(PropertyValue::literal("#ffffff"))));
    }

    #[test]
    fn brand_tier_accepts_token_refs_and_blends() {
        let idx = index();
        let brand = name("--brand-light-layer-0-text");
        assert!(validate(&brand, token_ref("--tokens-color-gray-900"), &idx).is_ok());
        let blend = PropertyValue::Blend {
            fg: name("--tokens-color-gray-900"),
            bg: name("--tokens-color-gray-000"),
            opacity: Opacity::Ref(name("--tokens-opacity-high")),
        };
        assert!(validate(&brand, blend, &idx).is_ok());
    }

    #[test]
    fn fixed_blend_weight_is_repaired_to_an_opacity_token() {
        let brand = name("--brand-light-layer-0-text");
        let fixed = PropertyValue::Blend {
            fg: name("--tokens-color-gray-900"),
            bg: name("--tokens-color-gray-000"),
            opacity: Opacity::Percent(87.0),
        };
        assert_eq!(
            validate(&brand, fixed, &index()),
            Ok(Verdict::Repaired {
                from: "color-mix(in srgb, var(--tokens-color-gray-900) 87%, var(--tokens-color-gray-000))"
                    .to_string(),
                to: PropertyValue::Blend {
                    fg: name("--tokens-color-gray-900"),
                    bg: name("--tokens-color-gray-000"),
                    opacity: Opacity::Ref(name("--tokens-opacity-high")),
                },
            })
        );
    }

    #[test]
    fn unmatched_blend_weight_is_rejected() {
        let half = PropertyValue::Blend {
            fg: name("--tokens-color-gray-900"),
            bg: name("--tokens-color-gray-000"),
            opacity: Opacity::Percent(50.0),
        };
        let err = validate(&name("--ui-card-text"), half, &index()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnmatchedLiteral {
                name: name("--ui-card-text"),
                value: "color-mix(in srgb, var(--tokens-color-gray-900) 50%, var(--tokens-color-gray-000))"
                    .to_string(),
            }
        );
    }

    #[test]
    fn token_operands_must_exist() {
        let idx = index();
        let brand = name("--brand-light-layer-0-text");
        assert_eq!(
            validate(&brand, token_ref("--tokens-color-bogus-500"), &idx),
            Err(ValidationError::UnknownTarget {
                name: brand.clone(),
                target: name("--tokens-color-bogus-500"),
            })
        );
        let blend = PropertyValue::Blend {
            fg: name("--tokens-color-gray-900"),
            bg: name("--tokens-color-gray-000"),
            opacity: Opacity::Ref(name("--tokens-opacity-missing")),
        };
        let err = validate(&name("--ui-card-text"), blend, &idx).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownTarget { .. }), "{err}");
        assert_eq!(err.name(), &name("--ui-card-text"));
        // Other tiers are left to the caller.
        assert!(validate(&name("--ui-card-text"), token_ref("--brand-light-nope"), &idx).is_ok());
    }

    #[test]
    fn brand_tier_rejects_brand_operands() {
        let err = validate(
            &name("--brand-light-layer-0-text"),
            token_ref("--brand-light-core-black"),
            &index(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::ForbiddenReference {
                name: name("--brand-light-layer-0-text"),
                target: name("--brand-light-core-black"),
            }
        );
    }

    #[test]
    fn ui_tier_may_reference_brand() {
        let verdict = validate(
            &name("--ui-card-text"),
            token_ref("--brand-light-layer-0-text"),
            &index(),
        );
        assert!(verdict.is_ok());
        assert!(validate(&name("--ui-card-text"), token_ref("--app-accent"), &index()).is_err());
    }

    #[test]
    fn literals_are_repaired_by_reverse_lookup() {
        let idx = index();
        let brand = name("--brand-light-core-black");
        assert_eq!(
            validate(&brand, PropertyValue::literal("#000"), &idx),
            Ok(Verdict::Repaired {
                from: "#000".to_string(),
                to: token_ref("--tokens-color-gray-900"),
            })
        );
        let size = validate(&name("--brand-light-dimensions-md"), PropertyValue::literal("16px"), &idx);
        assert_eq!(size.unwrap().value(), &token_ref("--tokens-size-md"));
        let op = validate(&name("--brand-light-text-emphasis"), PropertyValue::literal("0.87"), &idx);
        assert_eq!(op.unwrap().value(), &token_ref("--tokens-opacity-high"));
    }

    #[test]
    fn unmatched_literals_are_rejected() {
        let err = validate(
            &name("--brand-light-core-black"),
            PropertyValue::literal("#123456"),
            &index(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::UnmatchedLiteral { .. }));
        assert_eq!(err.name(), &name("--brand-light-core-black"));
        assert!(
            validate(&name("--ui-x"), PropertyValue::literal("bold"), &index()).is_err()
        );
    }
}
