//! Record template expansion.
//!
//! A record template is plain text with `%` directives:
//!
//! | Directive | Expands to |
//! |-----------|------------|
//! | `%t` `%T` | rendered time |
//! | `%n`      | logger name |
//! | `%N`      | logger name followed by `": "`, or nothing for an empty name |
//! | `%i`      | caller thread tag |
//! | `%I`      | `"(<tag>) "`, or nothing on the main thread |
//! | `%p` `%P` | process id / parent process id |
//! | `%l` `%L` | level name, lowercase / uppercase |
//! | `%m` `%M` | the rendered message |
//! | `%%`      | a literal `%` |
//!
//! Unknown directives are copied through unchanged, as is a lone trailing `%`.

use std::borrow::Cow;

use super::thread::CallerThread;
use crate::level::level_name;

/// Maximum size of a rendered record, in bytes.
pub const MAX_RECORD_LENGTH: usize = 512;

/// Everything a template can refer to.
pub struct RecordFields<'a> {
    pub time: &'a str,
    pub message: &'a str,
    pub name: &'a str,
    pub level: i32,
    pub caller: &'a CallerThread,
}

/// Append `s` to `out` without letting `out` grow past `max` bytes.
///
/// The cut happens on a char boundary so the record stays valid UTF-8.
/// Returns `false` when `s` did not fit whole; callers append nothing more
/// after that.
pub(crate) fn push_capped(out: &mut String, s: &str, max: usize) -> bool {
    let room = max.saturating_sub(out.len());
    if s.len() <= room {
        out.push_str(s);
        return true;
    }
    let mut end = room;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    out.push_str(&s[..end]);
    false
}

fn parent_pid() -> String {
    #[cfg(unix)]
    {
        std::os::unix::process::parent_id().to_string()
    }
    #[cfg(not(unix))]
    {
        String::new()
    }
}

/// Expand `template` into a record capped at [`MAX_RECORD_LENGTH`].
pub fn expand(template: &str, fields: &RecordFields<'_>) -> String {
    expand_capped(template, fields, MAX_RECORD_LENGTH)
}

pub(crate) fn expand_capped(template: &str, fields: &RecordFields<'_>, max: usize) -> String {
    let mut record = String::with_capacity(template.len().min(max) + fields.message.len().min(max));
    let mut chars = template.chars();
    let mut buf = [0u8; 4];

    while let Some(c) = chars.next() {
        if c != '%' {
            if !push_capped(&mut record, c.encode_utf8(&mut buf), max) {
                break;
            }
            continue;
        }

        let Some(directive) = chars.next() else {
            push_capped(&mut record, "%", max);
            break;
        };

        let piece: Cow<'_, str> = match directive {
            't' | 'T' => fields.time.into(),
            'n' => fields.name.into(),
            'N' if fields.name.is_empty() => "".into(),
            'N' => format!("{}: ", fields.name).into(),
            'i' => fields.caller.tag().into(),
            'I' => fields.caller.marker().into(),
            'p' => std::process::id().to_string().into(),
            'P' => parent_pid().into(),
            'l' => level_name(fields.level, false).into(),
            'L' => level_name(fields.level, true).into(),
            'm' | 'M' => fields.message.into(),
            '%' => "%".into(),
            other => format!("%{}", other).into(),
        };
        if !push_capped(&mut record, &piece, max) {
            break;
        }
    }

    record
}
