use serde::{Deserialize, Serialize};

pub const RECENT_CAPACITY: usize = 8;

/// Palette offered by the reaction bar.
pub const QUICK_REACTIONS: [&str; 6] = ["👍", "❤️", "😂", "😮", "😢", "😡"];

pub const RECENT_CATEGORY: &str = "Recent";

/// Most entries the picker's Recent category shows.
pub const PICKER_RECENT_LIMIT: usize = 24;

const CATALOG: [(&str, &[&str]); 7] = [
    (
        "Smileys",
        &[
            "😀", "😃", "😄", "😁", "😆", "😅", "😂", "🤣", "😊", "😇", "🙂", "🙃", "😉", "😌", "😍", "🥰",
            "😘", "😗", "😙", "😚", "😋", "😛", "😝", "😜", "🤪", "🤨", "🧐", "🤓", "😎", "🤩", "🥳", "😏",
        ],
    ),
    (
        "Hearts",
        &[
            "❤️", "🧡", "💛", "💚", "💙", "💜", "🖤", "🤍", "🤎", "💔", "❣️", "💕", "💞", "💓", "💗", "💖",
            "💘", "💝", "💟", "♥️", "💌", "💋", "💍", "💎",
        ],
    ),
    (
        "People",
        &[
            "👋", "🤚", "✋", "🖖", "👌", "🤌", "🤏", "✌️", "🤞", "🤟", "🤘", "🤙", "👈", "👉", "👆", "👇",
            "👍", "👎", "👊", "✊", "🤛", "🤜", "👏", "🙌", "👐", "🤲", "🤝", "🙏", "✍️", "💅", "🤳", "💪",
        ],
    ),
    (
        "Animals",
        &[
            "🐶", "🐱", "🐭", "🐹", "🐰", "🦊", "🐻", "🐼", "🐨", "🐯", "🦁", "🐮", "🐷", "🐸", "🐵", "🐔",
            "🐧", "🐦", "🐤", "🐣", "🐥", "🦆", "🦅", "🦉", "🦇", "🐺", "🐗", "🐴", "🦄", "🐝", "🐛", "🦋",
        ],
    ),
    (
        "Food",
        &[
            "🍎", "🍐", "🍊", "🍋", "🍌", "🍉", "🍇", "🍓", "🫐", "🍈", "🍒", "🍑", "🥭", "🍍", "🥥", "🥝",
            "🍅", "🍆", "🥑", "🥦", "🥬", "🥒", "🌶️", "🫑", "🌽", "🥕", "🫒", "🧄", "🧅", "🥔", "🍠", "🥐",
        ],
    ),
    (
        "Travel",
        &[
            "🚗", "🚕", "🚙", "🚌", "🚎", "🏎️", "🚓", "🚑", "🚒", "🚐", "🛻", "🚚", "🚛", "🚜", "🛵", "🏍️",
            "🛺", "🚲", "🛴", "🛹", "🛼", "🚁", "🛸", "🚀", "✈️", "🛩️", "🛫", "🛬", "🪂", "⛵", "🚤", "🛥️",
        ],
    ),
    (
        "Objects",
        &[
            "⌚", "📱", "💻", "⌨️", "🖥️", "🖨️", "🖱️", "🖲️", "🕹️", "🗜️", "💽", "💾", "💿", "📀", "📼", "📷",
            "📸", "📹", "🎥", "📽️", "🎞️", "📞", "☎️", "📟", "📠", "📺", "📻", "🎙️", "🎚️", "🎛️", "🧭", "⏱️",
        ],
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub emojis: Vec<String>,
}

/// The emoji picker: a Recent category followed by the fixed catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picker {
    categories: Vec<Category>,
}

impl Picker {
    pub fn new(recent: &RecentEmojis) -> Self {
        let recent = Category {
            name: RECENT_CATEGORY.to_string(),
            emojis: recent
                .as_slice()
                .iter()
                .take(PICKER_RECENT_LIMIT)
                .cloned()
                .collect(),
        };
        let catalog = CATALOG.iter().map(|(name, emojis)| Category {
            name: name.to_string(),
            emojis: emojis.iter().map(|e| e.to_string()).collect(),
        });

        Self {
            categories: std::iter::once(recent).chain(catalog).collect(),
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Keep the emoji containing `query`, dropping categories left empty.
    /// A blank query returns every category unchanged, Recent included.
    pub fn search(&self, query: &str) -> Vec<Category> {
        let query = query.trim();
        if query.is_empty() {
            return self.categories.clone();
        }
        self.categories
            .iter()
            .filter_map(|c| {
                let emojis: Vec<String> = c.emojis.iter().filter(|e| e.contains(query)).cloned().collect();
                (!emojis.is_empty()).then(|| Category {
                    name: c.name.clone(),
                    emojis,
                })
            })
            .collect()
    }
}

/// Most-recently-used first, no duplicates, at most [`RECENT_CAPACITY`] entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentEmojis(Vec<String>);

impl RecentEmojis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from an existing list, oldest duplicates and overflow dropped.
    pub fn seeded<I, S>(emoji: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut recent = Self::new();
        let items: Vec<String> = emoji.into_iter().map(Into::into).collect();
        for e in items.into_iter().rev() {
            recent.promote(&e);
        }
        recent
    }

    /// Move `emoji` to the front.
    pub fn promote(&mut self, emoji: &str) {
        self.0.retain(|e| e != emoji);
        self.0.insert(0, emoji.to_string());
        self.0.truncate(RECENT_CAPACITY);
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
