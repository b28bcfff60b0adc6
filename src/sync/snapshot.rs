use std::collections::HashSet;

/// The parts of a Discord user the membership tables care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSnapshot {
    pub id: u64,
    pub name: String,
    pub discriminator: String,
}

impl MemberSnapshot {
    /// `name#discriminator`, the value stored in `members.discordUser`.
    pub fn tag(&self) -> String {
        format!("{}#{}", self.name, self.discriminator)
    }

    /// Inverse of [`MemberSnapshot::tag`]. Names may contain `#`, so the split
    /// happens at the last one.
    pub fn from_tag(id: u64, tag: &str) -> Self {
        let (name, discriminator) = tag.rsplit_once('#').unwrap_or((tag, "0"));
        Self {
            id,
            name: name.to_string(),
            discriminator: discriminator.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildSnapshot {
    pub id: u64,
    pub name: String,
    pub members: Vec<MemberSnapshot>,
}

impl GuildSnapshot {
    /// Adds members not already present, keeping the existing entry when ids
    /// collide.
    pub fn merge_members(&mut self, others: impl IntoIterator<Item = MemberSnapshot>) {
        let mut seen: HashSet<u64> = self.members.iter().map(|m| m.id).collect();
        for member in others {
            if seen.insert(member.id) {
                self.members.push(member);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_splits_on_last_hash() {
        let snapshot = MemberSnapshot::from_tag(9, "we#ird#0042");
        assert_eq!(snapshot.name, "we#ird");
        assert_eq!(snapshot.discriminator, "0042");
        assert_eq!(snapshot.tag(), "we#ird#0042");
    }

    #[test]
    fn untagged_name_gets_zero_discriminator() {
        let snapshot = MemberSnapshot::from_tag(9, "alice");
        assert_eq!(snapshot.tag(), "alice#0");
    }

    #[test]
    fn merge_members_skips_known_ids() {
        let mut guild = GuildSnapshot {
            id: 500,
            name: "Ensō".to_string(),
            members: vec![MemberSnapshot::from_tag(1, "Alice#0001")],
        };

        guild.merge_members(vec![
            MemberSnapshot::from_tag(1, "Alice-renamed#0001"),
            MemberSnapshot::from_tag(2, "Bob#0002"),
            MemberSnapshot::from_tag(2, "Bob#0002"),
        ]);

        let tags: Vec<String> = guild.members.iter().map(MemberSnapshot::tag).collect();
        assert_eq!(tags, vec!["Alice#0001", "Bob#0002"]);
    }
}
