//! Source selection and parameter parsing.
//!
//! A source is selected on the command line as a name followed by free-form
//! parameters: bare values are positional, `key=value` pairs are keywords.
//!
//! ```text
//! --source dynamic 55.7522 37.6156 speed=30 radius=0.5
//!          ^name   ^positional     ^keywords
//! ```

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use super::error::GeneratorError;
use crate::fix::{duration_from_secs, TransitionMode, MAX_DURATION_SECS};

/// A source name plus its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub name: String,
    pub params: SourceParams,
}

impl SourceSpec {
    /// Builds a spec from a name and raw parameter strings.
    pub fn parse<I, S>(name: impl Into<String>, args: I) -> Result<Self, GeneratorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.into().trim().to_lowercase();
        let params = SourceParams::parse(&name, args)?;
        Ok(Self { name, params })
    }
}

/// Positional and keyword parameters for one source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceParams {
    positional: Vec<String>,
    keywords: BTreeMap<String, String>,
}

impl SourceParams {
    /// Splits raw arguments into positional values and `key=value` keywords.
    ///
    /// Keyword names are case-insensitive. A repeated keyword is an error.
    pub fn parse<I, S>(generator: &str, args: I) -> Result<Self, GeneratorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut params = Self::default();
        for arg in args {
            let arg = arg.as_ref().trim();
            if arg.is_empty() {
                continue;
            }
            match arg.split_once('=') {
                Some((key, value)) => {
                    let key = key.trim().to_lowercase();
                    if key.is_empty() {
                        return Err(GeneratorError::invalid(
                            generator,
                            "keyword",
                            arg,
                            "missing keyword name before '='",
                        ));
                    }
                    if params.keywords.contains_key(&key) {
                        return Err(GeneratorError::invalid(
                            generator,
                            &key,
                            value,
                            "keyword given more than once",
                        ));
                    }
                    params.keywords.insert(key, value.trim().to_string());
                }
                None => params.positional.push(arg.to_string()),
            }
        }
        Ok(params)
    }

    /// Positional values in order.
    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    /// Raw keyword value.
    pub fn keyword(&self, key: &str) -> Option<&str> {
        self.keywords.get(key).map(String::as_str)
    }

    /// Rejects keywords outside `accepted` and more than `max_positional`
    /// positional values.
    pub fn ensure_known(
        &self,
        generator: &str,
        accepted: &[&'static str],
        max_positional: usize,
    ) -> Result<(), GeneratorError> {
        if let Some(keyword) = self.keywords.keys().find(|k| !accepted.contains(&k.as_str())) {
            return Err(GeneratorError::UnknownKeyword {
                generator: generator.to_string(),
                keyword: keyword.clone(),
                accepted: accepted.to_vec(),
            });
        }
        if self.positional.len() > max_positional {
            return Err(GeneratorError::TooManyParameters {
                generator: generator.to_string(),
                expected: max_positional,
                actual: self.positional.len(),
            });
        }
        Ok(())
    }

    /// Required positional value.
    pub fn required(
        &self,
        generator: &str,
        index: usize,
        parameter: &'static str,
    ) -> Result<&str, GeneratorError> {
        self.positional
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| GeneratorError::MissingParameter {
                generator: generator.to_string(),
                parameter,
            })
    }

    /// Required positional value parsed as a finite number.
    pub fn required_f64(
        &self,
        generator: &str,
        index: usize,
        parameter: &'static str,
    ) -> Result<f64, GeneratorError> {
        let raw = self.required(generator, index, parameter)?;
        parse_finite(generator, parameter, raw)
    }

    /// Keyword parsed as a finite number, or `default` when absent.
    pub fn keyword_f64(
        &self,
        generator: &str,
        key: &str,
        default: f64,
    ) -> Result<f64, GeneratorError> {
        match self.keyword(key) {
            Some(raw) => parse_finite(generator, key, raw),
            None => Ok(default),
        }
    }

    /// Keyword parsed with `FromStr`, or `default` when absent.
    pub fn keyword_parse<T>(&self, generator: &str, key: &str, default: T) -> Result<T, GeneratorError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.keyword(key) {
            Some(raw) => raw
                .parse()
                .map_err(|e: T::Err| GeneratorError::invalid(generator, key, raw, e.to_string())),
            None => Ok(default),
        }
    }

    /// `transition=` keyword (default auto).
    pub fn transition(&self, generator: &str) -> Result<TransitionMode, GeneratorError> {
        self.keyword_parse(generator, "transition", TransitionMode::Auto)
    }

    /// Keyword holding a duration in seconds; must be strictly positive and
    /// at most `MAX_DURATION_SECS`.
    pub fn keyword_duration(
        &self,
        generator: &str,
        key: &str,
        default_secs: f64,
    ) -> Result<Duration, GeneratorError> {
        let secs = self.keyword_f64(generator, key, default_secs)?;
        duration_from_secs(secs)
            .filter(|d| !d.is_zero())
            .ok_or_else(|| {
                GeneratorError::invalid(
                    generator,
                    key,
                    secs,
                    format!("must be greater than 0 and at most {} seconds", MAX_DURATION_SECS),
                )
            })
    }
}

fn parse_finite(generator: &str, parameter: &str, raw: &str) -> Result<f64, GeneratorError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| GeneratorError::invalid(generator, parameter, raw, "expected a number"))
}
