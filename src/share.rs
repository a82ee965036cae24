//! Share tokens: a compact readable encoding of one or more presets, fit
//! for a URL fragment.
//!
//! Format per preset: `name/ROUNDSxDURATION/REST/MODE[+flags][/iMIN-MAX/nMIN-MAX][/wSECS][/dSECS]`.
//! Presets are joined with `|`, active preset first, and the whole token may
//! carry a `@theme.mode` suffix. Tokens from older releases are base64 JSON
//! with no `/` in them; those still decode.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use itertools::Itertools;
use serde::Deserialize;

use crate::preset::Preset;
use crate::theme::{Theme, ThemeMode};
use crate::time;
use crate::timing_mode::TimingMode;

/// Where shared configurations open in a browser.
pub const SHARE_URL_BASE: &str = "https://cornerbell.app/";

/// Everything a token can carry.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedState {
    pub presets: Vec<Preset>,
    pub active_preset_id: String,
    pub theme: Option<(Theme, ThemeMode)>,
}

pub fn encode_preset(preset: &Preset) -> String {
    let mut s = format!(
        "{}/{}x{}/{}/{}",
        sanitize_name(&preset.name),
        preset.rounds,
        time::format_short(preset.round_duration),
        time::format_short(preset.rest_duration),
        preset.timing_mode.id(),
    );
    let mut flags = Vec::new();
    if preset.progressive_intensity {
        flags.push("prog");
    }
    if preset.hide_next_switch {
        flags.push("hide");
    }
    if !flags.is_empty() {
        s.push('+');
        s.push_str(&flags.join("+"));
    }
    if preset.timing_mode == TimingMode::Custom {
        s.push_str(&format!(
            "/i{}-{}/n{}-{}",
            preset.intense_min, preset.intense_max, preset.normal_min, preset.normal_max
        ));
    }
    if preset.warmup_duration > 0 {
        s.push_str(&format!("/w{}", preset.warmup_duration));
    }
    if preset.cooldown_duration > 0 {
        s.push_str(&format!("/d{}", preset.cooldown_duration));
    }
    s
}

/// Join all presets, active one first. The decoder reads position, not ids,
/// so ordering is the whole active-selection signal.
pub fn encode_state(presets: &[Preset], active_id: &str) -> String {
    let active = presets.iter().find(|p| p.id == active_id);
    let others = presets.iter().filter(|p| p.id != active_id);
    active.into_iter().chain(others).map(encode_preset).join("|")
}

/// The full export token, theme suffix included.
pub fn full_token(presets: &[Preset], active_id: &str, theme: Theme, mode: ThemeMode) -> String {
    format!(
        "{}@{}.{}",
        encode_state(presets, active_id),
        theme.id(),
        mode.id()
    )
}

pub fn share_url(token: &str) -> String {
    format!("{}#{}", SHARE_URL_BASE, token)
}

/// Accept either a bare token or a full URL with a `#` fragment.
pub fn token_from_input(input: &str) -> &str {
    match input.rfind('#') {
        Some(idx) => &input[idx + 1..],
        None => input,
    }
}

/// Decode one preset segment. Returns `None` when the round duration is
/// missing/zero or the timing mode is unknown; the caller drops just this
/// entry.
pub fn decode_preset(segment: &str) -> Option<Preset> {
    let parts: Vec<&str> = segment.split('/').collect();
    if parts.len() < 4 {
        return None;
    }

    let name = parts[0].replace('-', " ");
    let name = name.trim();

    let (rounds_str, duration_str) = parts[1].split_once('x')?;
    if rounds_str.is_empty()
        || duration_str.is_empty()
        || !rounds_str.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let rounds: u32 = rounds_str.parse().ok()?;
    let round_duration = parse_url_duration(duration_str);
    if round_duration == 0 {
        return None;
    }
    let rest_duration = parse_url_duration(parts[2]);

    let mut mode_and_flags = parts[3].split('+');
    let timing_mode: TimingMode = mode_and_flags.next()?.parse().ok()?;
    let flags: Vec<&str> = mode_and_flags.collect();

    let mut preset = Preset::new(if name.is_empty() { "Preset" } else { name });
    preset.rounds = rounds;
    preset.round_duration = round_duration;
    preset.rest_duration = rest_duration;
    preset.timing_mode = timing_mode;
    preset.progressive_intensity = flags.contains(&"prog");
    preset.hide_next_switch = flags.contains(&"hide");

    for part in &parts[4..] {
        if timing_mode == TimingMode::Custom {
            if let Some((min, max)) = range_segment(part, 'i') {
                preset.intense_min = min;
                preset.intense_max = max;
            }
            if let Some((min, max)) = range_segment(part, 'n') {
                preset.normal_min = min;
                preset.normal_max = max;
            }
        }
        if let Some(secs) = tagged_number(part, 'w') {
            preset.warmup_duration = secs;
        }
        if let Some(secs) = tagged_number(part, 'd') {
            preset.cooldown_duration = secs;
        }
    }

    Some(preset)
}

/// Decode a whole token. Compact entries that fail to parse are dropped
/// individually; when none survive (or the token has no `/` at all) the
/// legacy base64 path is tried before giving up.
pub fn decode_state(token: &str) -> Option<DecodedState> {
    if token.is_empty() {
        return None;
    }
    let (presets_part, theme) = split_theme_suffix(token);

    if presets_part.contains('/') {
        let presets: Vec<Preset> = presets_part.split('|').filter_map(decode_preset).collect();
        if let Some(first) = presets.first() {
            let active_preset_id = first.id.clone();
            return Some(DecodedState {
                presets,
                active_preset_id,
                theme,
            });
        }
    }

    let legacy = decode_legacy(presets_part)?;
    let first_id = legacy.presets.first()?.id.clone();
    Some(DecodedState {
        active_preset_id: legacy.active_preset_id.unwrap_or(first_id),
        presets: legacy.presets,
        theme,
    })
}

/// Older releases stored URL-safe base64 JSON. Standard alphabet after
/// character mapping, padding optional.
const LEGACY_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LegacyState {
    presets: Vec<Preset>,
    active_preset_id: Option<String>,
}

fn decode_legacy(part: &str) -> Option<LegacyState> {
    let normalized = part.replace('-', "+").replace('_', "/");
    let bytes = LEGACY_BASE64.decode(normalized.as_bytes()).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Strip a trailing `@theme.mode` when both halves are recognized;
/// otherwise the `@` belongs to the preset data.
fn split_theme_suffix(token: &str) -> (&str, Option<(Theme, ThemeMode)>) {
    if let Some(at) = token.rfind('@') {
        let suffix = &token[at + 1..];
        if let Some((theme_id, mode_id)) = suffix.split_once('.') {
            if let (Ok(theme), Ok(mode)) =
                (theme_id.parse::<Theme>(), mode_id.parse::<ThemeMode>())
            {
                return (&token[..at], Some((theme, mode)));
            }
        }
    }
    (token, None)
}

/// Collapse a free-form name into the token alphabet. Delimiter characters
/// and whitespace become `-`, runs collapse, edges trim, and an empty result
/// falls back to `Preset`.
fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_dash = false;
    for c in name.chars() {
        let mapped = if matches!(c, '|' | '/' | '+') || c.is_whitespace() {
            '-'
        } else {
            c
        };
        if mapped == '-' {
            if !prev_dash {
                out.push('-');
            }
            prev_dash = true;
        } else {
            out.push(mapped);
            prev_dash = false;
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "Preset".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Durations inside tokens: `3m`, `3m20s`, `3m20`, `90s`, or bare seconds.
/// Anything else falls back to its leading digits, then to 0.
fn parse_url_duration(s: &str) -> u32 {
    if s.is_empty() {
        return 0;
    }
    if let Some(secs) = minutes_form(s) {
        return secs;
    }
    if let Some(secs) = seconds_form(s) {
        return secs;
    }
    time::leading_int(s)
}

fn minutes_form(s: &str) -> Option<u32> {
    let (mins, rest) = take_digits(s)?;
    let rest = rest.strip_prefix('m')?;
    if rest.is_empty() {
        return Some(mins * 60);
    }
    let (secs, rest) = match take_digits(rest) {
        Some((v, r)) => (v, r),
        None => (0, rest),
    };
    let rest = rest.strip_prefix('s').unwrap_or(rest);
    if !rest.is_empty() {
        return None;
    }
    Some(mins * 60 + secs)
}

fn seconds_form(s: &str) -> Option<u32> {
    let (secs, rest) = take_digits(s)?;
    if rest == "s" {
        Some(secs)
    } else {
        None
    }
}

fn take_digits(s: &str) -> Option<(u32, &str)> {
    let end = s.bytes().take_while(|b| b.is_ascii_digit()).count();
    if end == 0 {
        return None;
    }
    let value = s[..end].parse().ok()?;
    Some((value, &s[end..]))
}

/// `i10-20` style segment: tag letter, two dash-joined numbers, nothing
/// else.
fn range_segment(segment: &str, tag: char) -> Option<(u32, u32)> {
    let (lo, hi) = segment.strip_prefix(tag)?.split_once('-')?;
    Some((whole_number(lo)?, whole_number(hi)?))
}

/// `w60` style segment: tag letter, one number, nothing else.
fn tagged_number(segment: &str, tag: char) -> Option<u32> {
    whole_number(segment.strip_prefix(tag)?)
}

/// Plain digits only. Signs, whitespace and trailing characters all make
/// the segment invalid rather than partially parsed.
fn whole_number(part: &str) -> Option<u32> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}
