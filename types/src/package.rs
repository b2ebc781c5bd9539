use crate::PackageRecord;

pub const DEFAULT_PACKAGE_ICON: &str =
    "https://marticliment.com/resources/package_white.png";

pub const FIELD_SEPARATOR: char = '|';

/// Fields every record carries. An icon may follow as one more field.
pub const REQUIRED_FIELDS: usize = 6;

impl PackageRecord {
    /// A record that could not be parsed. Text fields are empty.
    pub fn invalid() -> Self {
        Self {
            name: String::new(),
            id: String::new(),
            version: String::new(),
            new_version: String::new(),
            source: String::new(),
            manager: String::new(),
            icon: DEFAULT_PACKAGE_ICON.to_string(),
            valid: false,
        }
    }
}

// name|id|version|new-version|source|manager[|icon]
impl From<&str> for PackageRecord {
    fn from(record: &str) -> Self {
        let fields: Vec<&str> = record.split(FIELD_SEPARATOR).collect();

        let (icon, fields) = match fields.split_at_checked(REQUIRED_FIELDS) {
            Some((fields, [])) => (DEFAULT_PACKAGE_ICON, fields),
            Some((fields, [""])) => (DEFAULT_PACKAGE_ICON, fields),
            Some((fields, [icon])) => (*icon, fields),
            _ => return Self::invalid(),
        };

        Self {
            name: fields[0].to_string(),
            id: fields[1].to_string(),
            version: fields[2].to_string(),
            new_version: fields[3].to_string(),
            source: fields[4].to_string(),
            manager: fields[5].to_string(),
            icon: icon.to_string(),
            valid: true,
        }
    }
}
