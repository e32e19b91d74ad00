use std::fmt::{self, Debug, Display, Write};

use rand::{distributions::Alphanumeric, Rng};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Eight alphanumeric bytes, enough to key states, closures, and elements
/// within one session.
///
/// Ids are drawn from the session's seeded RNG, so the HTTP render and the
/// websocket run of the same handler produce identical ids.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RandomId([u8; 8]);

#[derive(Debug, thiserror::Error)]
#[error("ids are exactly 8 alphanumeric characters")]
pub struct InvalidId;

impl RandomId {
    pub(crate) fn from_rng<R: Rng>(rng: &mut R) -> Self {
        Self([(); 8].map(|_| rng.sample(Alphanumeric)))
    }

    pub(crate) fn parse(s: &str) -> Result<Self, InvalidId> {
        let bytes: [u8; 8] = s.as_bytes().try_into().map_err(|_| InvalidId)?;
        if !bytes.iter().all(u8::is_ascii_alphanumeric) {
            return Err(InvalidId);
        }

        Ok(Self(bytes))
    }

    pub(crate) fn write_to(&self, output: &mut dyn Write) -> fmt::Result {
        for byte in self.0 {
            output.write_char(char::from(byte))?;
        }

        Ok(())
    }
}

impl Debug for RandomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RandomId(")?;
        self.write_to(f)?;
        f.write_char(')')
    }
}

impl Display for RandomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f)
    }
}

impl Serialize for RandomId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RandomId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_what_it_prints() {
        let mut rng = rand::rngs::mock::StepRng::new(0, 1);
        let id = RandomId::from_rng(&mut rng);

        let parsed = RandomId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(RandomId::parse("short").is_err());
        assert!(RandomId::parse("muchtoolong").is_err());
        assert!(RandomId::parse("bad-char").is_err());
        assert!(RandomId::parse("abcd1234").is_ok());
    }

    #[test]
    fn serializes_as_a_string() {
        let id = RandomId::parse("abcd1234").unwrap();
        assert_eq!("\"abcd1234\"", serde_json::to_string(&id).unwrap());

        let back: RandomId = serde_json::from_str("\"abcd1234\"").unwrap();
        assert_eq!(id, back);
    }
}
