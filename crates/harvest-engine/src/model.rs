//! Targets and the fixed-schema records collected from them.
//!
//! Every row type comes in two flavours: the `Raw*` form an extractor fills
//! from the page, with each field optional, and the row written to the result
//! table. `Raw*::fill` applies the per-field default when the page did not
//! provide a value. Counts default to `0`, text defaults to an empty string.

use serde::{Deserialize, Serialize};

/// The kind of object a run collects. One run never mixes kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    #[default]
    Profile,
    Review,
    #[serde(alias = "restaurant")]
    Business,
}

impl ObjectKind {
    /// Stem used in result file names.
    pub fn file_stem(&self) -> &'static str {
        match self {
            ObjectKind::Profile => "profile",
            ObjectKind::Review => "review",
            ObjectKind::Business => "res_info",
        }
    }

    /// What one target of this kind is called in logs and reports.
    pub fn noun(&self) -> &'static str {
        match self {
            ObjectKind::Profile => "user",
            ObjectKind::Review | ObjectKind::Business => "restaurant",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            ObjectKind::Profile => ProfileRow::COLUMNS,
            ObjectKind::Review => ReviewRow::COLUMNS,
            ObjectKind::Business => BusinessRow::COLUMNS,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ObjectKind::Profile => "profile",
            ObjectKind::Review => "review",
            ObjectKind::Business => "business",
        };
        f.write_str(name)
    }
}

/// One addressable unit to crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Row index in the loaded target list.
    pub index: usize,
    pub identifier: String,
    pub name: String,
    /// Base URL; page tokens are appended to it.
    pub locator: String,
}

impl Target {
    pub fn page_url(&self, token: &str) -> String {
        format!("{}{}", self.locator, token)
    }
}

macro_rules! row_schema {
    (
        $(#[$meta:meta])*
        pub struct $row:ident / $raw:ident {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty = $default:expr ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize)]
        pub struct $row {
            $( $(#[$fmeta])* pub $field: $ty, )*
        }

        /// Values read from the page before defaults are applied.
        #[derive(Debug, Clone, Default, PartialEq, Deserialize)]
        pub struct $raw {
            $( pub $field: Option<$ty>, )*
        }

        impl $raw {
            pub fn fill(self) -> $row {
                $row {
                    $( $field: self.$field.unwrap_or_else(|| $default), )*
                }
            }
        }

        impl $row {
            pub const COLUMNS: &'static [&'static str] = &[$(stringify!($field)),*];
        }
    };
}

row_schema! {
    /// Profile page of one user.
    pub struct ProfileRow / RawProfile {
        /// Taken from the target list, never from the page.
        userid: String = String::new(),
        name: String = String::new(),
        nickname: String = String::new(),
        /// Comma separated; empty when only the default avatar is shown.
        profile_photo_urls: String = String::new(),
        friends: u32 = 0,
        reviews: u32 = 0,
        photos: u32 = 0,
        /// Number of elite years.
        elites: u32 = 0,
        tagline: String = String::new(),
        star_5: u32 = 0,
        star_4: u32 = 0,
        star_3: u32 = 0,
        star_2: u32 = 0,
        star_1: u32 = 0,
        helpful: u32 = 0,
        thanks: u32 = 0,
        love_this: u32 = 0,
        oh_no: u32 = 0,
        review_updates: u32 = 0,
        firsts: u32 = 0,
        followers: u32 = 0,
        /// `Category (count)` pairs, comma separated, at most five.
        top_categories: String = String::new(),
        thank_you: u32 = 0,
        cute_pic: u32 = 0,
        good_writer: u32 = 0,
        hot_stuff: u32 = 0,
        just_a_note: u32 = 0,
        like_your_profile: u32 = 0,
        write_more: u32 = 0,
        you_are_cool: u32 = 0,
        great_photos: u32 = 0,
        great_lists: u32 = 0,
        you_are_funny: u32 = 0,
        location: String = String::new(),
        yelping_since: String = String::new(),
        things_i_love: String = String::new(),
        find_me_in: String = String::new(),
        my_hometown: String = String::new(),
        my_blog_or_website: String = String::new(),
        when_im_not_yelping: String = String::new(),
        why_you_should_read_my_reviews: String = String::new(),
        my_second_favorite_website: String = String::new(),
        last_great_book: String = String::new(),
        my_first_concert: String = String::new(),
        my_favorite_movie: String = String::new(),
        my_last_meal_on_earth: String = String::new(),
        dont_tell_anyone_else_but: String = String::new(),
        most_recent_discovery: String = String::new(),
        current_crush: String = String::new(),
    }
}

row_schema! {
    /// One review on a business listing.
    pub struct ReviewRow / RawReview {
        /// Taken from the target list, never from the page.
        yelpid: String = String::new(),
        /// Taken from the target list, never from the page.
        name: String = String::new(),
        user_name: String = String::new(),
        user_id: String = String::new(),
        /// `1` when the reviewer carries an elite badge.
        user_elite: u8 = 0,
        /// `1` when the review is marked "First to Review".
        user_first_review: u8 = 0,
        user_loc: String = String::new(),
        user_friend_num: u32 = 0,
        user_review_num: u32 = 0,
        user_photos_num: u32 = 0,
        rating: u8 = 0,
        date: String = String::new(),
        /// `1` when the review is an updated review.
        updated: u8 = 0,
        posted_photo_num: u32 = 0,
        check_ins_num: u32 = 0,
        comment: String = String::new(),
        helpful: u32 = 0,
        thanks: u32 = 0,
        love_this: u32 = 0,
        oh_no: u32 = 0,
        owner_comment_date: String = String::new(),
        owner_comment: String = String::new(),
        /// Earlier reviews by the same user, each list comma separated.
        previous_ratings: String = String::new(),
        previous_dates: String = String::new(),
        previous_comments: String = String::new(),
        previous_helpfuls: String = String::new(),
        previous_thanks: String = String::new(),
        previous_love_this: String = String::new(),
        previous_oh_no: String = String::new(),
    }
}

row_schema! {
    /// Header information of one business listing.
    pub struct BusinessRow / RawBusiness {
        /// Taken from the target list, never from the page.
        yelpid: String = String::new(),
        name: String = String::new(),
        closed: u8 = 0,
        verified: u8 = 0,
        rating: f32 = 0.0,
        review: u32 = 0,
        pricerange: String = String::new(),
        categorylist: String = String::new(),
        photos: u32 = 0,
        phone: String = String::new(),
        address: String = String::new(),
        openingtimes: String = String::new(),
        morebusinessinfo: String = String::new(),
    }
}

/// Everything collected from one successfully visited target.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Profile(ProfileRow),
    /// All reviews gathered across the target's pages.
    Reviews(Vec<ReviewRow>),
    Business(BusinessRow),
}

impl Record {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Record::Profile(_) => ObjectKind::Profile,
            Record::Reviews(_) => ObjectKind::Review,
            Record::Business(_) => ObjectKind::Business,
        }
    }

    /// Number of table rows this record contributes.
    pub fn row_count(&self) -> usize {
        match self {
            Record::Reviews(rows) => rows.len(),
            Record::Profile(_) | Record::Business(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_applies_defaults_for_missing_fields() {
        let raw = RawReview {
            user_name: Some("Ann".into()),
            rating: Some(4),
            ..Default::default()
        };
        let row = raw.fill();
        assert_eq!(row.user_name, "Ann");
        assert_eq!(row.rating, 4);
        assert_eq!(row.helpful, 0);
        assert_eq!(row.comment, "");
    }

    #[test]
    fn raw_rows_tolerate_nulls_and_missing_keys() {
        let raw: RawBusiness =
            serde_yaml::from_str("name: Cafe\nphone: null\nreview: 12\n").expect("parse");
        let row = raw.fill();
        assert_eq!(row.name, "Cafe");
        assert_eq!(row.phone, "");
        assert_eq!(row.review, 12);
    }

    #[test]
    fn columns_follow_field_order() {
        assert_eq!(ReviewRow::COLUMNS.len(), 29);
        assert_eq!(ReviewRow::COLUMNS[0], "yelpid");
        assert_eq!(BusinessRow::COLUMNS.last(), Some(&"morebusinessinfo"));
        assert_eq!(ObjectKind::Profile.columns()[0], "userid");
    }

    #[test]
    fn kind_accepts_legacy_restaurant_name() {
        let kind: ObjectKind = serde_yaml::from_str("restaurant").expect("parse");
        assert_eq!(kind, ObjectKind::Business);
    }
}
