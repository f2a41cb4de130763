#![allow(clippy::missing_errors_doc)]

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use gridfire_core::InputFrame;
use serde::{Deserialize, Serialize};

const SCRIPT_DOMAIN: &str = "gridfire";
const SCRIPT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded script payload.
pub(crate) const SCRIPT_HEADER: &str = "gridfire:v1";
/// Delimiter used to separate the prefix, frame count and payload.
const FIELD_DELIMITER: char = ':';

/// Recorded session input: the master seed plus one frame per fixed step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct ReplayScript {
    /// Seed the session derived its random streams from.
    pub seed: u64,
    /// Input frames in tick order.
    pub frames: Vec<InputFrame>,
}

impl ReplayScript {
    /// Encodes the script into a single-line string suitable for sharing.
    #[must_use]
    pub(crate) fn encode(&self) -> String {
        let payload = SerializableScript {
            seed: self.seed,
            frames: self.frames.clone(),
        };
        let bytes = bincode::serialize(&payload).expect("replay script serialization never fails");
        let encoded = STANDARD_NO_PAD.encode(bytes);
        format!("{SCRIPT_HEADER}:{}:{encoded}", self.frames.len())
    }

    /// Decodes a script from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, ReplayTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ReplayTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(ReplayTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(ReplayTransferError::MissingVersion)?;
        let frame_count = parts.next().ok_or(ReplayTransferError::MissingFrameCount)?;
        let payload = parts.next().ok_or(ReplayTransferError::MissingPayload)?;

        if domain != SCRIPT_DOMAIN {
            return Err(ReplayTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SCRIPT_VERSION {
            return Err(ReplayTransferError::UnsupportedVersion(version.to_owned()));
        }

        let declared = parse_frame_count(frame_count)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(ReplayTransferError::InvalidEncoding)?;
        let decoded: SerializableScript =
            bincode::deserialize(&bytes).map_err(ReplayTransferError::InvalidPayload)?;

        if decoded.frames.len() != declared {
            return Err(ReplayTransferError::FrameCountMismatch {
                declared,
                found: decoded.frames.len(),
            });
        }

        Ok(Self {
            seed: decoded.seed,
            frames: decoded.frames,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializableScript {
    seed: u64,
    frames: Vec<InputFrame>,
}

/// Errors that can occur while decoding replay transfer strings.
#[derive(Debug)]
pub(crate) enum ReplayTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the encoded script.
    MissingPrefix,
    /// The encoded script did not contain a version segment.
    MissingVersion,
    /// The encoded script did not include its frame count.
    MissingFrameCount,
    /// The encoded script did not include the payload segment.
    MissingPayload,
    /// The encoded script used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The encoded script used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The frame count could not be parsed from the encoded script.
    InvalidFrameCount(String),
    /// The payload held a different number of frames than the header declared.
    FrameCountMismatch {
        /// Frame count promised by the header segment.
        declared: usize,
        /// Frame count actually present in the payload.
        found: usize,
    },
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload could not be deserialised.
    InvalidPayload(bincode::Error),
}

impl fmt::Display for ReplayTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "replay payload was empty"),
            Self::MissingPrefix => write!(f, "replay string is missing the prefix"),
            Self::MissingVersion => write!(f, "replay string is missing the version"),
            Self::MissingFrameCount => write!(f, "replay string is missing the frame count"),
            Self::MissingPayload => write!(f, "replay string is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "replay prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "replay version '{version}' is not supported")
            }
            Self::InvalidFrameCount(count) => {
                write!(f, "could not parse replay frame count '{count}'")
            }
            Self::FrameCountMismatch { declared, found } => {
                write!(f, "replay header declares {declared} frames but the payload holds {found}")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode replay payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not parse replay payload: {error}")
            }
        }
    }
}

impl Error for ReplayTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_frame_count(frame_count: &str) -> Result<usize, ReplayTransferError> {
    frame_count
        .trim()
        .parse::<usize>()
        .map_err(|_| ReplayTransferError::InvalidFrameCount(frame_count.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfire_core::Thrust;

    #[test]
    fn round_trip_seed_only_script() {
        let script = ReplayScript {
            seed: 0x5eed_cafe,
            frames: Vec::new(),
        };

        let encoded = script.encode();
        assert!(encoded.starts_with(&format!("{SCRIPT_HEADER}:0:")));

        let decoded = ReplayScript::decode(&encoded).expect("script decodes");
        assert_eq!(script, decoded);
    }

    #[test]
    fn round_trip_recorded_script() {
        let frames = vec![
            InputFrame {
                horizontal: Thrust::Positive,
                vertical: Thrust::Negative,
                aim: false,
                crouch: false,
                trigger: true,
            },
            InputFrame {
                horizontal: Thrust::Neutral,
                vertical: Thrust::Neutral,
                aim: true,
                crouch: true,
                trigger: false,
            },
        ];
        let script = ReplayScript { seed: 41, frames };

        let encoded = script.encode();
        assert!(encoded.starts_with(&format!("{SCRIPT_HEADER}:2:")));

        let decoded = ReplayScript::decode(&encoded).expect("script decodes");
        assert_eq!(script, decoded);
    }

    #[test]
    fn tampered_frame_count_is_rejected() {
        let script = ReplayScript {
            seed: 7,
            frames: vec![InputFrame::default(), InputFrame::default()],
        };

        let tampered = script.encode().replacen(":2:", ":3:", 1);
        match ReplayScript::decode(&tampered) {
            Err(ReplayTransferError::FrameCountMismatch { declared, found }) => {
                assert_eq!(declared, 3);
                assert_eq!(found, 2);
            }
            other => panic!("expected a frame count mismatch, got {other:?}"),
        }
    }

    #[test]
    fn foreign_prefixes_are_rejected() {
        let error = ReplayScript::decode("maze:v1:0:AAAA").expect_err("prefix must be rejected");
        match error {
            ReplayTransferError::InvalidPrefix(prefix) => assert_eq!(prefix, "maze"),
            other => panic!("expected an invalid prefix, got {other:?}"),
        }
    }
}
