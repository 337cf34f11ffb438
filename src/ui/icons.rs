//! Shared UI icons and emojis.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("\u{2705} ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("\u{274C} ", "[ERR]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("\u{2728} ", "*");
pub static SKIP: Emoji<'_, '_> = Emoji("\u{23ED}\u{FE0F}  ", "[SKIP]");
pub static EYES: Emoji<'_, '_> = Emoji("\u{1F440} ", "[MANUAL]");
pub static CLOCK: Emoji<'_, '_> = Emoji("\u{23F1}\u{FE0F}  ", "[T]");
