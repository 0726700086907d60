//! Target list loading.
//!
//! The list is a CSV file whose columns are found by exact header name.
//! Profiles need `user_id` or `userid`. Reviews and businesses need
//! `yelp_id` or `yelpid`, and reviews additionally need `scrapedurl`.
//! A `name` column is optional everywhere.

use crate::error::ConfigError;
use crate::model::{ObjectKind, Target};
use std::io::Read;
use std::path::Path;
use tracing::info;

const PROFILE_URL: &str = "https://www.yelp.com/user_details?userid=";
const BUSINESS_URL: &str = "https://www.yelp.com/biz/";

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    names
        .iter()
        .find_map(|name| headers.iter().position(|header| header == *name))
}

fn missing(names: &[&str]) -> ConfigError {
    ConfigError::MissingColumn {
        expected: names.join(" or "),
    }
}

/// Builds the targets of a `kind` run from CSV data, one per row, indexed by row.
pub fn parse_target_list<R: Read>(reader: R, kind: ObjectKind) -> Result<Vec<Target>, ConfigError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = reader.headers()?.clone();

    let id_names: &[&str] = match kind {
        ObjectKind::Profile => &["user_id", "userid"],
        ObjectKind::Review | ObjectKind::Business => &["yelp_id", "yelpid"],
    };
    let id_column = find_column(&headers, id_names).ok_or_else(|| missing(id_names))?;
    let url_column = find_column(&headers, &["scrapedurl"]);
    if kind == ObjectKind::Review && url_column.is_none() {
        return Err(missing(&["scrapedurl"]));
    }
    let name_column = find_column(&headers, &["name"]);

    let mut targets = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let field = |column: Option<usize>| {
            column
                .and_then(|c| record.get(c))
                .unwrap_or_default()
                .to_string()
        };
        let identifier = field(Some(id_column));
        let locator = match kind {
            ObjectKind::Profile => format!("{}{}", PROFILE_URL, identifier),
            ObjectKind::Review => field(url_column),
            ObjectKind::Business => match url_column.and_then(|c| record.get(c)) {
                Some(url) if !url.is_empty() => url.to_string(),
                _ => format!("{}{}", BUSINESS_URL, identifier),
            },
        };
        targets.push(Target {
            index,
            name: field(name_column),
            identifier,
            locator,
        });
    }
    Ok(targets)
}

/// Reads the target list from a local file.
pub async fn load_target_list(path: &Path, kind: ObjectKind) -> Result<Vec<Target>, ConfigError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::MissingTargetList(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    let targets = parse_target_list(bytes.as_slice(), kind)?;
    info!(
        "Loaded {} targets from {}",
        targets.len(),
        path.display()
    );
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_targets_use_user_details_url() {
        let csv = "userid,name\nabc,Ann\n def ,Bob\n";
        let targets = parse_target_list(csv.as_bytes(), ObjectKind::Profile).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[1].index, 1);
        assert_eq!(targets[1].identifier, "def");
        assert_eq!(
            targets[0].locator,
            "https://www.yelp.com/user_details?userid=abc"
        );
        assert_eq!(targets[0].name, "Ann");
    }

    #[test]
    fn review_targets_need_scraped_url() {
        let err = parse_target_list("yelp_id,name\nx,Cafe\n".as_bytes(), ObjectKind::Review)
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingColumn { expected } if expected == "scrapedurl"));

        let targets = parse_target_list(
            "yelpid,scrapedurl\nx,https://www.yelp.com/biz/x\n".as_bytes(),
            ObjectKind::Review,
        )
        .unwrap();
        assert_eq!(targets[0].locator, "https://www.yelp.com/biz/x");
        assert_eq!(targets[0].name, "");
    }

    #[test]
    fn business_falls_back_to_biz_url() {
        let targets =
            parse_target_list("yelp_id\ncafe-one\n".as_bytes(), ObjectKind::Business).unwrap();
        assert_eq!(targets[0].locator, "https://www.yelp.com/biz/cafe-one");
    }

    #[test]
    fn missing_identifier_column_is_reported() {
        let err = parse_target_list("id,name\n1,a\n".as_bytes(), ObjectKind::Profile).unwrap_err();
        assert!(
            matches!(err, ConfigError::MissingColumn { expected } if expected == "user_id or userid")
        );
    }

    #[tokio::test]
    async fn missing_file_is_reported_by_name() {
        let err = load_target_list(Path::new("/nonexistent/User_List.csv"), ObjectKind::Profile)
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingTargetList(_)));
    }
}
