//! A `nom`-based parser for the canonical path form (`$['key'][0][*]`).
use super::{Path, PathSegment};
use crate::error::{Error, Result};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag},
    character::complete::{char, u64 as nom_u64},
    combinator::{map, map_res, opt, value},
    multi::many0,
    sequence::{delimited, preceded},
};

/// Parse a canonical path string. Anything that does not round-trip is a
/// caller bug and is rejected.
pub fn parse_canonical(input: &str) -> Result<Path> {
    match path(input) {
        Ok(("", segments)) => Ok(Path::new(segments)),
        Ok((rem, _)) => Err(Error::MalformedPath {
            input: input.to_string(),
            reason: format!("unexpected trailing input '{}'", rem),
        }),
        Err(e) => Err(Error::MalformedPath {
            input: input.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn path(input: &str) -> IResult<&str, Vec<PathSegment>> {
    preceded(char('$'), many0(segment)).parse(input)
}

fn segment(input: &str) -> IResult<&str, PathSegment> {
    delimited(char('['), alt((quoted_key, star, index)), char(']')).parse(input)
}

fn quoted_key(input: &str) -> IResult<&str, PathSegment> {
    map(
        delimited(
            char('\''),
            opt(escaped_transform(
                is_not("\\'"),
                '\\',
                alt((value("\\", tag("\\")), value("'", tag("'")))),
            )),
            char('\''),
        ),
        |name: Option<String>| PathSegment::Key(name.unwrap_or_default()),
    )
    .parse(input)
}

fn star(input: &str) -> IResult<&str, PathSegment> {
    value(PathSegment::IndexStar, char('*')).parse(input)
}

fn index(input: &str) -> IResult<&str, PathSegment> {
    map(map_res(nom_u64, usize::try_from), PathSegment::Index).parse(input)
}
