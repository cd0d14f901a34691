//! Static lexicons and the patterns compiled from them.
//!
//! Everything language-specific about the extractor lives here: section
//! headings, degree and institution vocabularies, month names and the
//! "ongoing" vocabulary. Supporting another language means extending these
//! tables (and supplying a matching `LocationSplitter`).

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;

/// Headings that close the education section. A line must consist of
/// exactly one of these (an optional trailing colon is tolerated).
pub const SECTION_HEADINGS: &[&str] = &[
    "doświadczenie",
    "doswiadczenie",
    "doświadczenie zawodowe",
    "doswiadczenie zawodowe",
    "umiejętności",
    "umiejetnosci",
    "certyfikaty",
    "certyfikaty i kursy",
    "kursy",
    "kursy i szkolenia",
    "szkolenia",
    "języki",
    "jezyki",
    "języki obce",
    "jezyki obce",
    "zainteresowania",
    "hobby",
    "projekty",
    "osiągnięcia",
    "osiagniecia",
    "służba wojskowa",
    "sluzba wojskowa",
    "dane osobowe",
    "kontakt",
    "o mnie",
    "podsumowanie",
    "experience",
    "work experience",
    "professional experience",
    "skills",
    "certifications",
    "certificates",
    "languages",
    "interests",
    "projects",
    "military service",
    "contact",
    "summary",
    "about me",
];

pub const ONGOING_TERMS: &[&str] = &[
    "obecnie",
    "aktualnie",
    "do dziś",
    "do dzis",
    "do teraz",
    "nadal",
    "w trakcie",
    "present",
    "current",
    "currently",
    "ongoing",
    "now",
    "today",
];

/// Month prefixes over ASCII-folded, lowercased tokens. Longer prefixes come
/// first so that e.g. "czerw" wins over "cze".
const MONTH_PREFIXES: &[(&str, u32)] = &[
    ("stycz", 1),
    ("luty", 2),
    ("lutego", 2),
    ("marz", 3),
    ("marc", 3),
    ("kwie", 4),
    ("czerw", 6),
    ("lipie", 7),
    ("lipc", 7),
    ("sierp", 8),
    ("wrze", 9),
    ("pazdz", 10),
    ("listop", 11),
    ("grud", 12),
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
    ("sept", 9),
    ("sty", 1),
    ("lut", 2),
    ("mar", 3),
    ("kwi", 4),
    ("maj", 5),
    ("may", 5),
    ("cze", 6),
    ("lip", 7),
    ("sie", 8),
    ("wrz", 9),
    ("paz", 10),
    ("lis", 11),
    ("gru", 12),
    ("jan", 1),
    ("feb", 2),
    ("apr", 4),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("oct", 10),
    ("okt", 10),
    ("nov", 11),
    ("dec", 12),
];

/// Words that may link two halves of a name but carry no content on their
/// own.
pub const CONNECTOR_WORDS: &[&str] = &[
    "w", "we", "na", "z", "ze", "i", "oraz", "im", "nr", "in", "at", "of", "from", "the", "and",
    "-", "–",
];

/// Cities recognized by the built-in recognizer, in nominative and locative
/// forms.
pub const CITIES: &[&str] = &[
    "Warszawa",
    "Warszawie",
    "Kraków",
    "Krakowie",
    "Łódź",
    "Łodzi",
    "Wrocław",
    "Wrocławiu",
    "Poznań",
    "Poznaniu",
    "Gdańsk",
    "Gdańsku",
    "Gdynia",
    "Gdyni",
    "Szczecin",
    "Szczecinie",
    "Bydgoszcz",
    "Bydgoszczy",
    "Lublin",
    "Lublinie",
    "Białystok",
    "Białymstoku",
    "Katowice",
    "Katowicach",
    "Gliwice",
    "Gliwicach",
    "Częstochowa",
    "Częstochowie",
    "Radom",
    "Radomiu",
    "Toruń",
    "Toruniu",
    "Rzeszów",
    "Rzeszowie",
    "Kielce",
    "Kielcach",
    "Olsztyn",
    "Olsztynie",
    "Opole",
    "Opolu",
    "Dęblin",
    "Dęblinie",
    "London",
    "Berlin",
    "Paris",
    "Prague",
    "Vienna",
];

/// Words that start capitalized runs which are never person names.
pub const NAME_STOPWORDS: &[&str] = &[
    "kierunek",
    "zawód",
    "specjalność",
    "specjalizacja",
    "wydział",
    "instytut",
    "katedra",
    "studia",
    "faculty",
    "department",
    "edukacja",
    "wykształcenie",
    "education",
    "curriculum",
    "vitae",
];

pub const FACULTY_WORDS: &[&str] = &["wydział", "katedra", "faculty", "department", "studia"];

const INSTITUTION_STEMS: &str = r"szko[łl]|szk[óo][łl]|zesp[óo][łl]|gimnazj|liceum|lice[óo]w|techniku|politechni|uniwersyt|akademi|kolegi|instytu|uczelni|konserwatori|universit|college|academy|school|institut|polytechnic|conservator";

pub static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:(?:moja|moje|my)[ \t]+)?(?:edukacja|wykszta[łl]cenie|education)\b[ \t]*:?",
    )
    .expect("heading pattern should compile")
});

pub static SECTION_END_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = SECTION_HEADINGS
        .iter()
        .map(|h| regex::escape(h).replace(' ', r"[ \t]+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?im)^[ \t]*(?:{alternatives})[ \t]*:?[ \t]*$"))
        .expect("section end pattern should compile")
});

pub static DEGREE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:mgr\.?[ \t]+in[żz]|magister\w*|licencja(?:t|ck)\w*|in[żz]ynier\w*|doktor\w*|bachelor(?:'s)?|master(?:'s)?|b\.?sc|m\.?sc|ph\.?d|mgr|lic|in[żz]|dr)\b\.?",
    )
    .expect("degree pattern should compile")
});

pub static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}\b").expect("year pattern should compile"));

pub static ONGOING_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = ONGOING_TERMS
        .iter()
        .map(|t| regex::escape(t).replace(' ', r"[ \t]+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternatives})\b")).expect("ongoing pattern should compile")
});

pub static MONTH_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:stycze[ńn]|stycznia|luty|lutego|marzec|marca|kwiecie[ńn]|kwietnia|maj|maja|czerwiec|czerwca|lipiec|lipca|sierpie[ńn]|sierpnia|wrzesie[ńn]|wrze[śs]nia|pa[źz]dziernik|pa[źz]dziernika|listopad|listopada|grudzie[ńn]|grudnia|january|february|march|april|may|june|july|august|september|october|november|december)\b",
    )
    .expect("month name pattern should compile")
});

/// Abbreviated month names are too ambiguous on their own; they only count
/// when a year follows.
pub static MONTH_ABBREV_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:sty|lut|mar|kwi|cze|lip|sie|wrz|pa[źz]|lis|gru|jan|feb|apr|jun|jul|aug|sept?|oct|okt|nov|dec)\.?[ \t]{0,2}\d{4}\b",
    )
    .expect("month abbreviation pattern should compile")
});

pub static NUMERIC_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(0?[1-9]|1[0-2])[./](\d{4})\b").expect("numeric date pattern should compile")
});

pub static INSTITUTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"(?:\p{{Lu}}[\p{{L}}.\-]*[ \t]+){{0,2}}\b\p{{L}}*(?i:{INSTITUTION_STEMS})\p{{L}}*(?:[ \t]+[\p{{L}}\p{{N}}.\-"„”']+)*"#
    ))
    .expect("institution pattern should compile")
});

pub static INSTITUTION_KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i){INSTITUTION_STEMS}"))
        .expect("institution keyword pattern should compile")
});

pub static FIELD_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:kierun(?:ek|ku)|zaw[óo]d|specjalno[śs][ćc]|specjalizacj[ai]|field[ \t]+of[ \t]+study|major|specialization)\b[ \t]*:?[ \t]*([^\n,;|\d()]+)",
    )
    .expect("field marker pattern should compile")
});

/// Leading marker stripped from field-of-study values.
pub static FIELD_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:kierun(?:ek|ku)|zaw[óo]d|specjalno[śs][ćc]|specjalizacj[ai]|field[ \t]+of[ \t]+study|major|specialization)\b[ \t]*:?[ \t]*",
    )
    .expect("field prefix pattern should compile")
});

pub static CAPITALIZED_RUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\p{Lu}[\p{L}\-]*\.?(?:[ \t]+(?:(?:w|we|im\.|nr|i|z|ze)[ \t]+)?(?:\p{Lu}[\p{L}\-]*\.?|\d{1,3}\b))*",
    )
    .expect("capitalized run pattern should compile")
});

pub fn is_valid_year(year: i32) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&year)
}

pub fn has_institution_keyword(text: &str) -> bool {
    INSTITUTION_KEYWORD_RE.is_match(text)
}

pub fn is_ongoing(text: &str) -> bool {
    ONGOING_RE.is_match(text)
}

/// Month number for a month-name token (full name, inflection, stem or
/// abbreviation, Polish or English).
pub fn month_number(token: &str) -> Option<u32> {
    let folded = fold_ascii(token).to_lowercase();
    let folded = folded.trim_end_matches('.');
    MONTH_PREFIXES
        .iter()
        .find(|(prefix, _)| folded.starts_with(prefix))
        .map(|&(_, month)| month)
}

pub fn is_connector(word: &str) -> bool {
    let word = word.trim_matches(|c: char| c == '.' || c == ',');
    CONNECTOR_WORDS.iter().any(|c| c.eq_ignore_ascii_case(word))
}

/// Decompose to NFKD and keep only ASCII; letters without a decomposition
/// (`ł`, `ø`, `đ`) are mapped by hand.
pub fn fold_ascii(text: &str) -> String {
    text.nfkd()
        .filter_map(|c| match c {
            'ł' => Some('l'),
            'Ł' => Some('L'),
            'ø' => Some('o'),
            'Ø' => Some('O'),
            'đ' => Some('d'),
            'Đ' => Some('D'),
            c if c.is_ascii() => Some(c),
            _ => None,
        })
        .collect()
}
