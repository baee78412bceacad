//! L0: parser for `/proc/<pid>/maps` plus a small filter-combinator API.
//!
//! One regex over the whole file, one [`Mapping`] per line, and a handful
//! of named predicates callers can `and_`/`or_` together (they can just as
//! well write their own closure — these are conveniences, not the only way
//! in).

use std::fs;

use regex::Regex;

/// One line of `/proc/<pid>/maps`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    pub start_address: u64,
    pub end_address: u64,
    pub size: u64,
    pub perms: String,
    pub offset: u64,
    pub dev: String,
    pub inode: String,
    pub pathname: String,
}

fn maps_regex() -> Regex {
    Regex::new(r"(?m)^([0-9a-f]+)-([0-9a-f]+) ([rwxsp-]{4}) ([0-9a-f]+) (\S+) (\d+)\s*(.*?)$")
        .expect("static maps regex is valid")
}

/// Parses the given maps-file text (the format of `/proc/<pid>/maps`).
pub fn parse(contents: &str) -> Vec<Mapping> {
    let re = maps_regex();
    re.captures_iter(contents)
        .map(|m| {
            let start_address = u64::from_str_radix(&m[1], 16).unwrap();
            let end_address = u64::from_str_radix(&m[2], 16).unwrap();
            Mapping {
                start_address,
                end_address,
                size: end_address - start_address,
                perms: m[3].to_string(),
                offset: u64::from_str_radix(&m[4], 16).unwrap(),
                dev: m[5].to_string(),
                inode: m[6].to_string(),
                pathname: m[7].to_string(),
            }
        })
        .collect()
}

/// Reads and parses `/proc/<pid>/maps`, keeping only mappings for which
/// `filter` (if given) returns `true`.
pub fn get_maps(pid: i32, filter: Option<&dyn Fn(&Mapping) -> bool>) -> std::io::Result<Vec<Mapping>> {
    let contents = fs::read_to_string(format!("/proc/{}/maps", pid))?;
    let mappings = parse(&contents);
    Ok(match filter {
        Some(f) => mappings.into_iter().filter(|m| f(m)).collect(),
        None => mappings,
    })
}

/// A logical AND of several filters.
pub fn and_<'a>(filters: Vec<Box<dyn Fn(&Mapping) -> bool + 'a>>) -> impl Fn(&Mapping) -> bool + 'a {
    move |m| filters.iter().all(|f| f(m))
}

/// A logical OR of several filters.
pub fn or_<'a>(filters: Vec<Box<dyn Fn(&Mapping) -> bool + 'a>>) -> impl Fn(&Mapping) -> bool + 'a {
    move |m| filters.iter().any(|f| f(m))
}

/// Matches mappings whose `pathname` equals `path`.
pub fn has_path(path: impl Into<String>) -> impl Fn(&Mapping) -> bool {
    let path = path.into();
    move |m| m.pathname == path
}

/// Matches mappings whose `perms` contains every character in `perms`.
pub fn has_perms(perms: &str) -> impl Fn(&Mapping) -> bool + '_ {
    move |m| perms.chars().all(|p| m.perms.contains(p))
}

/// Matches mappings by size: `eq` takes priority if given, otherwise both
/// `ge`/`le` (if given) must hold.
pub fn has_size(eq: Option<u64>, ge: Option<u64>, le: Option<u64>) -> impl Fn(&Mapping) -> bool {
    move |m| {
        if let Some(eq) = eq {
            return m.size == eq;
        }
        ge.map_or(true, |ge| m.size >= ge) && le.map_or(true, |le| m.size <= le)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str =
        "7f0e1b200000-7f0e1b228000 r-xp 00000000 fd:01 123456   /usr/lib/libc.so.6\n";

    #[test]
    fn parses_a_single_line() {
        let mappings = parse(LINE);
        assert_eq!(mappings.len(), 1);
        let m = &mappings[0];
        assert_eq!(m.start_address, 0x7f0e1b200000);
        assert_eq!(m.end_address, 0x7f0e1b228000);
        assert_eq!(m.size, 0x28000);
        assert_eq!(m.perms, "r-xp");
        assert_eq!(m.offset, 0);
        assert_eq!(m.dev, "fd:01");
        assert_eq!(m.inode, "123456");
        assert_eq!(m.pathname, "/usr/lib/libc.so.6");
    }

    #[test]
    fn size_is_always_end_minus_start() {
        for m in parse(LINE) {
            assert_eq!(m.size, m.end_address - m.start_address);
        }
    }

    #[test]
    fn parses_a_line_with_no_pathname() {
        let mappings = parse("00400000-00401000 rw-p 00000000 00:00 0 \n");
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].pathname, "");
    }

    #[test]
    fn has_perms_checks_all_chars_present() {
        let m = &parse(LINE)[0];
        assert!(has_perms("x")(m));
        assert!(has_perms("rx")(m));
        assert!(!has_perms("w")(m));
    }

    #[test]
    fn and_or_combine_like_boolean_operators() {
        let m = &parse(LINE)[0];
        let all_true = and_(vec![Box::new(has_perms("r")), Box::new(has_perms("x"))]);
        assert!(all_true(m));

        let one_false = and_(vec![Box::new(has_perms("r")), Box::new(has_perms("w"))]);
        assert!(!one_false(m));

        let either = or_(vec![Box::new(has_perms("w")), Box::new(has_perms("x"))]);
        assert!(either(m));
    }

    #[test]
    fn has_size_eq_ge_le() {
        let m = &parse(LINE)[0];
        assert!(has_size(Some(0x28000), None, None)(m));
        assert!(!has_size(Some(1), None, None)(m));
        assert!(has_size(None, Some(1), None)(m));
        assert!(!has_size(None, Some(0x29000), None)(m));
        assert!(has_size(None, None, Some(0x28000))(m));
        assert!(!has_size(None, None, Some(1))(m));
    }
}
