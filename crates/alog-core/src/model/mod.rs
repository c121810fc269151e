pub mod draft;
pub mod id;
pub mod records;
pub mod time;

pub use draft::{CharacterDraft, DmDraft, ItemDraft, LogDraft, UserDraft};
pub use records::{
    Character, DungeonMaster, ItemKind, LedgerItem, Log, LogType, ParseEnumError, Role, User,
    sort_chronologically,
};
