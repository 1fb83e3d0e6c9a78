//! Blend modes selectable at runtime

use std::fmt;
use std::str::FromStr;

/// Color blend applied by the selectable pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Blending disabled, source overwrites
    #[default]
    None,
    /// src·α + dst·(1−α)
    Normal,
    /// src·α + dst
    Add,
    /// dst − src·α
    Subtract,
    /// src·0 + dst·src
    Multiply,
    /// src·(1−dst) + dst
    Screen,
}

impl BlendMode {
    pub const ALL: [BlendMode; 6] = [
        Self::None,
        Self::Normal,
        Self::Add,
        Self::Subtract,
        Self::Multiply,
        Self::Screen,
    ];

    /// Human-readable label for display
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Normal => "Normal",
            Self::Add => "Add",
            Self::Subtract => "Subtract",
            Self::Multiply => "Multiply",
            Self::Screen => "Screen",
        }
    }

    /// Color component as (src factor, operation, dst factor), or `None` when disabled
    pub fn color_triple(
        self,
    ) -> Option<(wgpu::BlendFactor, wgpu::BlendOperation, wgpu::BlendFactor)> {
        use wgpu::BlendFactor as F;
        use wgpu::BlendOperation as Op;
        match self {
            Self::None => None,
            Self::Normal => Some((F::SrcAlpha, Op::Add, F::OneMinusSrcAlpha)),
            Self::Add => Some((F::SrcAlpha, Op::Add, F::One)),
            Self::Subtract => Some((F::SrcAlpha, Op::ReverseSubtract, F::One)),
            Self::Multiply => Some((F::Zero, Op::Add, F::Src)),
            Self::Screen => Some((F::OneMinusDst, Op::Add, F::One)),
        }
    }

    /// Full blend state. Alpha always keeps the source value.
    pub fn blend_state(self) -> Option<wgpu::BlendState> {
        self.color_triple().map(|(src_factor, operation, dst_factor)| wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor,
                dst_factor,
                operation,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::Zero,
                operation: wgpu::BlendOperation::Add,
            },
        })
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BlendMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown blend mode '{s}' (expected none, normal, add, subtract, multiply or screen)")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::BlendFactor as F;
    use wgpu::BlendOperation as Op;

    #[test]
    fn blend_table() {
        let expected = [
            (BlendMode::None, None),
            (BlendMode::Normal, Some((F::SrcAlpha, Op::Add, F::OneMinusSrcAlpha))),
            (BlendMode::Add, Some((F::SrcAlpha, Op::Add, F::One))),
            (BlendMode::Subtract, Some((F::SrcAlpha, Op::ReverseSubtract, F::One))),
            (BlendMode::Multiply, Some((F::Zero, Op::Add, F::Src))),
            (BlendMode::Screen, Some((F::OneMinusDst, Op::Add, F::One))),
        ];
        for (mode, triple) in expected {
            assert_eq!(mode.color_triple(), triple, "{mode}");
            assert_eq!(mode.blend_state().is_some(), triple.is_some());
        }
    }

    #[test]
    fn alpha_component_is_fixed() {
        for mode in BlendMode::ALL {
            if let Some(state) = mode.blend_state() {
                assert_eq!(state.alpha.src_factor, F::One);
                assert_eq!(state.alpha.operation, Op::Add);
                assert_eq!(state.alpha.dst_factor, F::Zero);
            }
        }
    }

    #[test]
    fn default_is_none() {
        assert_eq!(BlendMode::default(), BlendMode::None);
    }

    #[test]
    fn parses_labels() {
        assert_eq!("screen".parse::<BlendMode>(), Ok(BlendMode::Screen));
        assert_eq!("Normal".parse::<BlendMode>(), Ok(BlendMode::Normal));
        assert!("overlay".parse::<BlendMode>().is_err());
    }
}
