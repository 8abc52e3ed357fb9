use std::{cmp::Ordering, fmt};

use smallvec::SmallVec;

use crate::foundation::error::{CryptomatteError, CryptomatteResult};

/// Colour component a Cryptomatte channel is stored in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChannelType {
    /// `r` / `red`
    Red,
    /// `g` / `green`
    Green,
    /// `b` / `blue`
    Blue,
    /// `a` / `alpha`
    Alpha,
}

impl ChannelType {
    /// Parse a channel suffix, case-insensitively, in short or long form.
    pub fn parse(suffix: &str) -> Option<Self> {
        match suffix.to_ascii_lowercase().as_str() {
            "r" | "red" => Some(Self::Red),
            "g" | "green" => Some(Self::Green),
            "b" | "blue" => Some(Self::Blue),
            "a" | "alpha" => Some(Self::Alpha),
            _ => None,
        }
    }

    /// Whether channels of this type carry ids (as opposed to coverage).
    pub fn is_id(self) -> bool {
        matches!(self, Self::Red | Self::Blue)
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Red => "r",
            Self::Green => "g",
            Self::Blue => "b",
            Self::Alpha => "a",
        })
    }
}

/// A parsed indexed channel name such as `CryptoAsset00.r`.
///
/// Ordering is by `(index, channel_type)`; the typename does not take part.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelRepr {
    /// Layer name preceding the index.
    pub typename: String,
    /// Two-digit rank group index.
    pub index: u8,
    /// Component after the dot.
    pub channel_type: ChannelType,
    name: String,
}

impl ChannelRepr {
    /// Parse `<typename><2 digits>.<type>` where the digit run is exactly two long.
    pub fn parse(name: &str) -> CryptomatteResult<Self> {
        let (stem, _) = split_suffix(name)?;
        let digits = stem
            .bytes()
            .rev()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits != 2 {
            return Err(CryptomatteError::malformed_level(format!(
                "channel '{name}' must end in a two-digit index, found {digits} digits"
            )));
        }
        Self::parse_with_typename(name, &stem[..stem.len() - 2])
    }

    /// Parse `name` knowing its layer name up front; the layer name itself may end in digits.
    pub fn parse_with_typename(name: &str, typename: &str) -> CryptomatteResult<Self> {
        let malformed =
            |why: &str| CryptomatteError::malformed_level(format!("channel '{name}' {why}"));

        if typename.is_empty() {
            return Err(malformed("has no layer name"));
        }
        let (stem, suffix) = split_suffix(name)?;
        let index_text = stem
            .strip_prefix(typename)
            .ok_or_else(|| malformed("does not start with its layer name"))?;
        if index_text.len() != 2 || !index_text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed("must have a two-digit index"));
        }
        let index = index_text
            .parse::<u8>()
            .map_err(|e| malformed(&format!("has an unreadable index: {e}")))?;
        let channel_type =
            ChannelType::parse(suffix).ok_or_else(|| malformed("has an unknown channel type"))?;

        Ok(Self {
            typename: typename.to_string(),
            index,
            channel_type,
            name: name.to_string(),
        })
    }

    /// The full channel name this was parsed from.
    pub fn channel_name(&self) -> &str {
        &self.name
    }
}

impl PartialOrd for ChannelRepr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ChannelRepr {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.index, self.channel_type).cmp(&(other.index, other.channel_type))
    }
}

fn split_suffix(name: &str) -> CryptomatteResult<(&str, &str)> {
    match name.rsplit_once('.') {
        Some((stem, suffix)) if !suffix.is_empty() => Ok((stem, suffix)),
        _ => Err(CryptomatteError::malformed_level(format!(
            "channel '{name}' has no channel type"
        ))),
    }
}

/// Order indexed channels and check they form complete rank/coverage groups.
///
/// Indices must run contiguously from `00`. Every group is `r, g, b, a`, except the last,
/// which may stop after `r, g`.
pub fn sort_and_validate_channels(
    mut channels: Vec<ChannelRepr>,
) -> CryptomatteResult<Vec<ChannelRepr>> {
    if channels.is_empty() {
        return Err(CryptomatteError::malformed_level("no indexed cryptomatte channels"));
    }
    if let Some(other) = channels.iter().find(|c| c.typename != channels[0].typename) {
        return Err(CryptomatteError::malformed_level(format!(
            "channels of different layers mixed: '{}' and '{}'",
            channels[0].channel_name(),
            other.channel_name()
        )));
    }

    channels.sort();
    if let Some(pair) = channels.windows(2).find(|w| w[0].cmp(&w[1]) == Ordering::Equal) {
        return Err(CryptomatteError::malformed_level(format!(
            "duplicate channel '{}'",
            pair[1].channel_name()
        )));
    }

    let last_index = channels[channels.len() - 1].index;
    let mut start = 0;
    for expected in 0..=last_index {
        let group: SmallVec<[ChannelType; 4]> = channels[start..]
            .iter()
            .take_while(|c| c.index == expected)
            .map(|c| c.channel_type)
            .collect();
        if group.is_empty() {
            return Err(CryptomatteError::malformed_level(format!(
                "missing channel group {expected:02}"
            )));
        }

        let complete = group.as_slice()
            == [
                ChannelType::Red,
                ChannelType::Green,
                ChannelType::Blue,
                ChannelType::Alpha,
            ];
        let partial_tail =
            expected == last_index && group.as_slice() == [ChannelType::Red, ChannelType::Green];
        if !complete && !partial_tail {
            let found: Vec<String> = group.iter().map(ToString::to_string).collect();
            return Err(CryptomatteError::malformed_level(format!(
                "channel group {expected:02} has [{}], expected [r, g, b, a]",
                found.join(", ")
            )));
        }
        start += group.len();
    }

    Ok(channels)
}

/// Order legacy preview channels as `r, g, b`, dropping names with unknown components.
pub fn sort_legacy_channels<S: AsRef<str>>(names: &[S]) -> Vec<(ChannelType, String)> {
    let mut out: Vec<(ChannelType, String)> = names
        .iter()
        .filter_map(|n| {
            let n = n.as_ref();
            let (_, suffix) = n.rsplit_once('.')?;
            ChannelType::parse(suffix).map(|t| (t, n.to_string()))
        })
        .collect();
    out.sort_by_key(|(t, _)| *t);
    out
}

#[cfg(test)]
#[path = "../../tests/unit/layer/channels.rs"]
mod tests;
