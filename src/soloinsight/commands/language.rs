use crate::commands::helpers::persist_or_warn;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::Language;
use crate::store::{DataStore, Slot};
use crate::workspace::Workspace;

/// Show the language preference, or change it when `set` is given.
pub fn run<S: DataStore>(ws: &mut Workspace<S>, set: Option<Language>) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    if let Some(language) = set {
        ws.data_mut().language = language;
        persist_or_warn(ws, Slot::Language, &mut result);
        result.add_message(CmdMessage::success(format!("Language set to {}", language)));
    }
    Ok(result.with_language(ws.data().language))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::local::LocalStore;
    use crate::store::memory::MemBackend;

    #[test]
    fn shows_and_sets() {
        let mut ws = Workspace::open(LocalStore::new(MemBackend::new())).unwrap();
        assert_eq!(run(&mut ws, None).unwrap().language, Some(Language::En));
        run(&mut ws, Some(Language::Zh)).unwrap();
        let (store, _) = ws.into_parts();
        assert_eq!(Workspace::open(store).unwrap().data().language, Language::Zh);
    }
}
