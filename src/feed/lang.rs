// SPDX-License-Identifier: MPL-2.0

use crate::atproto::PostRecord;

/// Primary subtag of a BCP-47 tag, lower-cased: `en-US` -> `en`.
pub fn primary_subtag(lang: &str) -> String {
    lang.split(['-', '_'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Whether a post declares any of the target languages.
/// Posts that declare no languages never match.
pub fn is_post_in_language(record: &PostRecord, target_langs: &[String]) -> bool {
    let Some(langs) = record.langs.as_ref() else {
        return false;
    };
    langs.iter().map(|l| primary_subtag(l)).any(|lang| {
        !lang.is_empty() && target_langs.iter().any(|t| primary_subtag(t) == lang)
    })
}
