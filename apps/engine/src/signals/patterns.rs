//! Domain pattern matchers: the regex layer that turns raw RFP text into
//! typed matches. Everything here is pure string work; matchers return
//! structured hits in document order and never fail.

use std::sync::LazyLock;

use regex::Regex;

/// `<label> (<NN>%)` pairs, the standard way Korean RFPs print evaluation
/// criteria. Accepts full-width parentheses and fractional percentages.
static CRITERION_WEIGHT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([가-힣A-Za-z][가-힣A-Za-z ·/]{0,30}?)\s*[(（]\s*(\d{1,3}(?:\.\d+)?)\s*%\s*[)）]")
        .expect("valid criterion weight regex")
});

/// Korean monetary amounts: digits, an optional scale word, then 원.
static KRW_AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d[\d,]*(?:\.\d+)?)\s*(조|천억|백억|십억|억|천만|백만|십만|만)?\s*원")
        .expect("valid KRW amount regex")
});

/// Dollar amounts with an optional magnitude suffix.
static USD_AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:USD|US\$|\$)\s*(\d[\d,]*(?:\.\d+)?)\s*(million|billion|[mbk])?")
        .expect("valid USD amount regex")
});

/// KPI statements: a short label, a number, and a measurement unit.
static KPI_TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([가-힣A-Za-z][가-힣A-Za-z ·/]{1,24}?)\s*(\d[\d,]*(?:\.\d+)?)\s*(%|점|건|명|회|시간)")
        .expect("valid KPI target regex")
});

static KO_DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3})\s*개월").expect("valid duration regex"));

static EN_DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,3})\s*months?").expect("valid duration regex"));

/// `YYYY년 MM월` and `YYYY. MM.` style dates.
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})\s*[.년]\s*(\d{1,2})\s*[.월]?").expect("valid date regex")
});

#[derive(Debug, Clone, PartialEq)]
pub struct CriterionWeight {
    pub raw: String,
    pub label: String,
    /// Fraction in [0, 1], converted from the printed percentage.
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoneyAmount {
    pub raw: String,
    /// Normalized into base currency units (KRW won or USD dollars).
    pub amount: f64,
    pub currency: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KpiTarget {
    pub raw: String,
    pub name: String,
    pub target: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Duration {
    pub raw: String,
    pub months: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateRef {
    pub raw: String,
    pub year: i32,
    pub month: u32,
}

fn parse_number(s: &str) -> Option<f64> {
    s.replace(',', "").parse::<f64>().ok()
}

fn krw_multiplier(unit: &str) -> f64 {
    match unit {
        "조" => 1e12,
        "천억" => 1e11,
        "백억" => 1e10,
        "십억" => 1e9,
        "억" => 1e8,
        "천만" => 1e7,
        "백만" => 1e6,
        "십만" => 1e5,
        "만" => 1e4,
        _ => 1.0,
    }
}

fn usd_multiplier(suffix: &str) -> f64 {
    match suffix.to_lowercase().as_str() {
        "billion" | "b" => 1e9,
        "million" | "m" => 1e6,
        "k" => 1e3,
        _ => 1.0,
    }
}

/// All `<criterion> (<NN>%)` pairs in the text, in document order.
pub fn criterion_weights(text: &str) -> Vec<CriterionWeight> {
    CRITERION_WEIGHT_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let label = caps.get(1)?.as_str().trim().to_string();
            let percent = parse_number(caps.get(2)?.as_str())?;
            if !(0.0..=100.0).contains(&percent) {
                return None;
            }
            Some(CriterionWeight {
                raw: caps.get(0)?.as_str().trim().to_string(),
                label,
                weight: percent / 100.0,
            })
        })
        .collect()
}

/// All monetary amounts in the text, Korean and dollar notations.
pub fn money_amounts(text: &str) -> Vec<MoneyAmount> {
    let mut out = Vec::new();
    for caps in KRW_AMOUNT_RE.captures_iter(text) {
        let Some(n) = caps.get(1).and_then(|m| parse_number(m.as_str())) else {
            continue;
        };
        let unit = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        out.push(MoneyAmount {
            raw: caps[0].trim().to_string(),
            amount: n * krw_multiplier(unit),
            currency: "KRW",
        });
    }
    for caps in USD_AMOUNT_RE.captures_iter(text) {
        let Some(n) = caps.get(1).and_then(|m| parse_number(m.as_str())) else {
            continue;
        };
        let suffix = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        out.push(MoneyAmount {
            raw: caps[0].trim().to_string(),
            amount: n * usd_multiplier(suffix),
            currency: "USD",
        });
    }
    out
}

/// `<name> <number> <unit>` measurement statements.
pub fn kpi_targets(text: &str) -> Vec<KpiTarget> {
    KPI_TARGET_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let target = parse_number(caps.get(2)?.as_str())?;
            Some(KpiTarget {
                raw: caps.get(0)?.as_str().trim().to_string(),
                name: caps.get(1)?.as_str().trim().to_string(),
                target,
                unit: caps.get(3)?.as_str().to_string(),
            })
        })
        .collect()
}

/// Durations in months, Korean and English.
pub fn durations(text: &str) -> Vec<Duration> {
    let mut out = Vec::new();
    for re in [&*KO_DURATION_RE, &*EN_DURATION_RE] {
        for caps in re.captures_iter(text) {
            let Some(months) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) else {
                continue;
            };
            out.push(Duration {
                raw: caps[0].trim().to_string(),
                months,
            });
        }
    }
    out
}

/// Year-month references with a plausibility check on the month.
pub fn date_refs(text: &str) -> Vec<DateRef> {
    DATE_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
            let month = caps.get(2)?.as_str().parse::<u32>().ok()?;
            if !(1..=12).contains(&month) {
                return None;
            }
            Some(DateRef {
                raw: caps.get(0)?.as_str().trim().to_string(),
                year,
                month,
            })
        })
        .collect()
}
