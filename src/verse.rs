//! Verse lookup by chapter and verse number.
//!
//! Backs the built-in `find_verse` tool. A reference such as `2:183` is
//! validated locally, fetched from the verse service
//! (`POST {url}/express/chapter/{chapter}:{verse}`) and rendered as an
//! Arabic / Urdu / English block with a reading link.

use anyhow::{anyhow, bail, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;

use crate::config::VerseConfig;
use crate::http;

/// Number of chapters (surahs).
pub const CHAPTERS: u32 = 114;

/// Separator between verses of one lookup.
pub const VERSE_SEPARATOR: &str = "\n---\n\n";

const READING_LINK: &str = "https://www.alislam.org/quran/app";

/// Arabic chapter names, indexed by `chapter - 1`.
const SURAH_NAMES: [&str; CHAPTERS as usize] = [
    "الفاتحة", "البقرة", "آل عمران", "النساء", "المائدة", "الأنعام", "الأعراف", "الأنفال",
    "التوبة", "يونس", "هود", "يوسف", "الرعد", "إبراهيم", "الحجر", "النحل", "الإسراء", "الكهف",
    "مريم", "طه", "الأنبياء", "الحج", "المؤمنون", "النور", "الفرقان", "الشعراء", "النمل",
    "القصص", "العنكبوت", "الروم", "لقمان", "السجدة", "الأحزاب", "سبإ", "فاطر", "يس",
    "الصافات", "ص", "الزمر", "غافر", "فصلت", "الشورى", "الزخرف", "الدخان", "الجاثية",
    "الأحقاف", "محمد", "الفتح", "الحجرات", "ق", "الذاريات", "الطور", "النجم", "القمر",
    "الرحمن", "الواقعة", "الحديد", "المجادلة", "الحشر", "الممتحنة", "الصف", "الجمعة",
    "المنافقون", "التغابن", "الطلاق", "التحريم", "الملك", "القلم", "الحاقة", "المعارج", "نوح",
    "الجن", "المزمل", "المدثر", "القيامة", "الإنسان", "المرسلات", "النبأ", "النازعات", "عبس",
    "التكوير", "الانفطار", "المطففين", "الانشقاق", "البروج", "الطارق", "الأعلى", "الغاشية",
    "الفجر", "البلد", "الشمس", "الليل", "الضحى", "الشرح", "التين", "العلق", "القدر", "البينة",
    "الزلزلة", "العاديات", "القارعة", "التكاثر", "العصر", "الهمزة", "الفيل", "قريش", "الماعون",
    "الكوثر", "الكافرون", "النصر", "المسد", "الإخلاص", "الفلق", "الناس",
];

/// Arabic name of `chapter`, if it exists.
pub fn surah_name(chapter: u32) -> Option<&'static str> {
    chapter
        .checked_sub(1)
        .and_then(|i| SURAH_NAMES.get(i as usize))
        .copied()
}

/// A validated `chapter:verse` reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerseRef {
    pub chapter: u32,
    pub verse: u32,
}

impl VerseRef {
    pub fn new(chapter: u32, verse: u32) -> Result<Self> {
        if !(1..=CHAPTERS).contains(&chapter) {
            bail!("Chapter number must be between 1 and {}.", CHAPTERS);
        }
        if verse < 1 {
            bail!("Verse number must be greater than 0.");
        }
        Ok(Self { chapter, verse })
    }

    /// Parse tool parameters. Numbers may arrive as JSON strings or integers.
    pub fn from_params(chapter: &Value, verse: &Value) -> Result<Self> {
        let chapter = number_param(chapter, "chapter")?;
        let verse = number_param(verse, "verse")?;
        Self::new(chapter, verse)
    }
}

impl fmt::Display for VerseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chapter, self.verse)
    }
}

fn number_param(value: &Value, name: &str) -> Result<u32> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| anyhow!("Invalid {} number. Please provide a valid number.", name))
}

/// One verse as returned by the verse service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Verse {
    #[serde(rename = "ch")]
    pub chapter: u32,
    #[serde(rename = "v")]
    pub verse: u32,
    #[serde(rename = "ar", default)]
    pub arabic: String,
    #[serde(rename = "ur", default)]
    pub urdu: String,
    #[serde(rename = "en", default)]
    pub english: String,
}

impl Verse {
    pub fn link(&self) -> String {
        format!("{}/{}:{}", READING_LINK, self.chapter, self.verse)
    }

    /// Render the verse in all three languages.
    pub fn render(&self) -> String {
        let heading = format!(
            "Surah {}:{}",
            surah_name(self.chapter).unwrap_or_default(),
            self.verse
        );
        format!(
            "Chapter {ch}, Verse {v}\n\n\
             Arabic:\n{h}\n\n{ar}\n\n\
             Urdu:\n{h}\n\n{ur}\n\n\
             English:\n{h}\n\n{en}\n\n\
             Reference Link: {link}",
            ch = self.chapter,
            v = self.verse,
            h = heading,
            ar = self.arabic,
            ur = self.urdu,
            en = self.english,
            link = self.link(),
        )
    }
}

/// Render every verse of one lookup.
pub fn render_verses(verses: &[Verse]) -> String {
    verses
        .iter()
        .map(Verse::render)
        .collect::<Vec<_>>()
        .join(VERSE_SEPARATOR)
}

/// Client for the verse service.
pub struct VerseClient {
    client: reqwest::Client,
    url: String,
    max_retries: u32,
}

impl VerseClient {
    pub fn new(config: &VerseConfig) -> Result<Self> {
        Ok(Self {
            client: http::client(config.timeout_secs)?,
            url: config.url.clone(),
            max_retries: config.max_retries,
        })
    }

    /// Fetch the verses for `reference`. An empty list means not found.
    pub async fn fetch(&self, reference: &VerseRef) -> Result<Vec<Verse>> {
        let url = http::join_url(&self.url, &format!("express/chapter/{}", reference));
        // Arabic is always returned; every other flag selects one translation.
        let body = json!({
            "bn": false, "cn": false, "de": false, "en": true, "es": false,
            "f": 1, "fr": false, "hover": 0, "it": false, "my": false,
            "nw": false, "sc": false, "sp_en": false, "sp_ur": false, "sv": false,
            "ts": false, "ur": true, "v5": false, "zk": false
        });
        tracing::debug!(verse = %reference, "fetching verse");

        let json = http::send_json("Verse lookup", self.max_retries, || {
            self.client.post(&url).json(&body)
        })
        .await?;
        parse_verses(json)
    }
}

fn parse_verses(json: Value) -> Result<Vec<Verse>> {
    match json {
        Value::Null => Ok(Vec::new()),
        other => serde_json::from_value(other)
            .map_err(|e| anyhow!("Invalid verse response: {}", e)),
    }
}
