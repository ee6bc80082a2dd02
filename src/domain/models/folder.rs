use std::cmp::Ordering;

/// One entry in the folder list. `chat_count` is derived locally from the
/// chat collection rather than trusted from the stored record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub chat_count: usize,
    pub is_pinned: bool,
}

impl Folder {
    /// Pinned folders first, then alphabetically by name.
    pub fn compare(a: &Folder, b: &Folder) -> Ordering {
        if a.is_pinned != b.is_pinned {
            if a.is_pinned {
                return Ordering::Less;
            }
            return Ordering::Greater;
        }

        return a.name.to_lowercase().cmp(&b.name.to_lowercase());
    }
}
