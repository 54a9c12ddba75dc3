//! Lifecycle states of a runfolder and their on-disk tokens.

use core::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::RunfolderError;

// Defines the enum from variant => token mappings, together with the
// token conversions used by the sidecar file and the HTTP layer.
macro_rules! define_enum_with_str {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $str:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
        }

        impl $name {
            /// Every state, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)*];

            /// Canonical lowercase token, as written to the sidecar file.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)*
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = RunfolderError;

            /// Accepts the token or the variant name, in any case.
            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let token = value.trim().to_ascii_lowercase();
                match token.as_str() {
                    $($str => Ok(Self::$variant),)*
                    _ => Err(RunfolderError::InvalidState(value.to_string())),
                }
            }
        }
    };
}

define_enum_with_str! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    /// Processing state of a runfolder.
    ///
    /// Every state can be set from every other state; no transition is guarded.
    pub enum State {
        None => "none",
        /// Initial state of a freshly discovered runfolder.
        #[default]
        Ready => "ready",
        /// Claimed by a pipeline but not started yet.
        Pending => "pending",
        Started => "started",
        Done => "done",
        Error => "error",
        Cancelled => "cancelled",
    }
}
