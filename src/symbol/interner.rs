use std::collections::HashMap;

/// Append-only string table. Interned strings live for the rest of the
/// thread, so lookups hand out `&'static str`.
#[derive(Default)]
pub struct Interner {
    names: HashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

impl Interner {
    pub fn intern(&mut self, s: &str) -> u32 {
        if let Some(&idx) = self.names.get(s) {
            return idx;
        }

        let s: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let idx = self.strings.len() as u32;
        self.strings.push(s);
        self.names.insert(s, idx);
        idx
    }

    pub fn lookup(&self, idx: u32) -> &'static str {
        self.strings[idx as usize]
    }
}
