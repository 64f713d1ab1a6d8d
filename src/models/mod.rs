mod click;
mod link;

pub use click::{BrowserClicks, ClickEvent, CountryClicks, DailyClicks, NewClick, ReferrerClicks};
pub use link::{LinkData, ShortLink, ShortenRequest, ShortenResponse, UpdateLinkRequest};
