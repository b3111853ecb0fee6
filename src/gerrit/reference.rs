use std::fmt;

/// One immutable revision of a Gerrit change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ref {
    pub change_id: u64,
    pub patch_set: u32,
}

impl Ref {
    pub fn new(change_id: u64, patch_set: u32) -> Self {
        Self { change_id, patch_set }
    }

    /// A change whose patch set was not given; defaults to the first
    pub fn from_change(change_id: u64) -> Self {
        Self::new(change_id, 1)
    }

    /// `refs/changes/<shard>/<change>/<patchset>`, where the shard is the last
    /// two digits of the change number (or the whole number below 10)
    pub fn fetch_spec(&self) -> String {
        let id = self.change_id.to_string();
        let shard = if id.len() < 2 { id.as_str() } else { &id[id.len() - 2..] };
        format!("refs/changes/{}/{}/{}", shard, id, self.patch_set)
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.change_id, self.patch_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_spec() {
        assert_eq!(Ref::new(12345, 3).fetch_spec(), "refs/changes/45/12345/3");
        assert_eq!(Ref::new(100, 1).fetch_spec(), "refs/changes/00/100/1");
        assert_eq!(Ref::new(42, 2).fetch_spec(), "refs/changes/42/42/2");
    }

    #[test]
    fn test_fetch_spec_single_digit() {
        assert_eq!(Ref::new(7, 1).fetch_spec(), "refs/changes/7/7/1");
    }

    #[test]
    fn test_default_patch_set() {
        assert_eq!(Ref::from_change(7), Ref::new(7, 1));
        assert_eq!(Ref::new(12345, 3).to_string(), "12345/3");
    }
}
