use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug)]
pub struct UserName(String);

impl UserName {
    pub fn parse(s: String) -> Result<UserName, String> {
        let is_empty_or_whitespace = s.trim().is_empty();

        // A grapheme is a "user-perceived" character: `ö` is one grapheme
        // but two chars (`o` and `¨`). `true` selects the extended set.
        let is_too_long = s.graphemes(true).count() > 256;

        let forbidden_characters =
            ['/', '(', ')', '"', '<', '>', '\\', '{', '}'];
        let contains_forbidden_characters =
            s.chars().any(|g| forbidden_characters.contains(&g));

        if is_empty_or_whitespace
            || is_too_long
            || contains_forbidden_characters
        {
            Err(format!("{} is not a valid user name.", s))
        } else {
            Ok(Self(s))
        }
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
