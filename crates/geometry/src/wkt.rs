//! Minimal WKT reader for the geometry types the matchup engine uses.
//!
//! Supported: `POINT`, `LINESTRING`, `POLYGON`, `MULTIPOLYGON`.

use crate::error::{GeometryError, GeometryResult};
use crate::factory::Geometry;
use crate::point::Point;
use crate::shapes::{LineString, Polygon};

pub(crate) fn parse(wkt: &str) -> GeometryResult<Geometry> {
    let mut parser = Parser::new(wkt);
    let tag = parser.tag()?;
    let geometry = match tag.as_str() {
        "POINT" => {
            let coords = parser.coord_seq()?;
            match coords.as_slice() {
                [p] => Geometry::Point(*p),
                _ => return Err(parser.error("POINT needs exactly one coordinate")),
            }
        }
        "LINESTRING" => Geometry::LineString(LineString::new(&parser.coord_seq()?)?),
        "POLYGON" => Geometry::Polygon(polygon_from_rings(parser.ring_list()?)?),
        "MULTIPOLYGON" => {
            let polygons = parser
                .multi_ring_list()?
                .into_iter()
                .map(polygon_from_rings)
                .collect::<GeometryResult<Vec<_>>>()?;
            Geometry::MultiPolygon(polygons)
        }
        other => return Err(GeometryError::UnsupportedType(other.to_string())),
    };
    parser.finish()?;
    Ok(geometry)
}

fn polygon_from_rings(rings: Vec<Vec<Point>>) -> GeometryResult<Polygon> {
    match rings.split_first() {
        Some((shell, holes)) => Polygon::with_holes(shell, holes),
        None => Err(GeometryError::InvalidPolygon("no rings".to_string())),
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn error(&self, msg: &str) -> GeometryError {
        GeometryError::InvalidWkt(format!("{} at offset {} in '{}'", msg, self.pos, self.input))
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.input[self.pos..].chars().next()
    }

    fn expect(&mut self, c: char) -> GeometryResult<()> {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", c)))
        }
    }

    fn tag(&mut self) -> GeometryResult<String> {
        self.skip_whitespace();
        let rest = &self.input[self.pos..];
        let len = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected geometry type"));
        }
        self.pos += len;
        Ok(rest[..len].to_ascii_uppercase())
    }

    fn number(&mut self) -> GeometryResult<f64> {
        self.skip_whitespace();
        let rest = &self.input[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')))
            .unwrap_or(rest.len());
        let value = rest[..len]
            .parse::<f64>()
            .map_err(|_| self.error("expected number"))?;
        self.pos += len;
        Ok(value)
    }

    fn coord(&mut self) -> GeometryResult<Point> {
        let lon = self.number()?;
        let lat = self.number()?;
        Ok(Point::new(lon, lat))
    }

    /// `(x y, x y, ...)`
    fn coord_seq(&mut self) -> GeometryResult<Vec<Point>> {
        self.list(Self::coord)
    }

    /// `((x y, ...), (x y, ...))`
    fn ring_list(&mut self) -> GeometryResult<Vec<Vec<Point>>> {
        self.list(Self::coord_seq)
    }

    /// `(((x y, ...)), ((x y, ...)))`
    fn multi_ring_list(&mut self) -> GeometryResult<Vec<Vec<Vec<Point>>>> {
        self.list(Self::ring_list)
    }

    fn list<T>(&mut self, item: fn(&mut Self) -> GeometryResult<T>) -> GeometryResult<Vec<T>> {
        self.expect('(')?;
        let mut items = vec![item(self)?];
        while self.peek() == Some(',') {
            self.pos += 1;
            items.push(item(self)?);
        }
        self.expect(')')?;
        Ok(items)
    }

    fn finish(&mut self) -> GeometryResult<()> {
        match self.peek() {
            None => Ok(()),
            Some(_) => Err(self.error("trailing characters")),
        }
    }
}
