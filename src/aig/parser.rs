use std::{
    fs::File,
    io::{BufRead, BufReader, Lines},
    path::Path,
};

use crate::{Aig, NodeId, Result, aig::error::ParserError};

/// Splits a line in whitespace separated tokens, each with its 1-based column.
fn tokenize(line: &str) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                tokens.push((s + 1, &line[s..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => (),
        }
    }
    if let Some(s) = start {
        tokens.push((s + 1, &line[s..]));
    }
    tokens
}

fn read_u64(s: &str, line: usize, what: &'static str) -> std::result::Result<u64, ParserError> {
    s.parse::<u64>().map_err(|_| ParserError::InvalidToken {
        line,
        what,
        token: s.to_string(),
    })
}

fn check_even(lit: u64, line: usize, col: usize, what: &'static str) -> Result<()> {
    if lit & 1 == 1 {
        return Err(ParserError::CannotInvert {
            line,
            col,
            what,
            lit,
        }
        .into());
    }
    Ok(())
}

/// Largest literal (and header count) accepted, matching a signed 32-bit literal.
const MAX_LIT: u64 = i32::MAX as u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    m: u64,
    i: u64,
    l: u64,
    o: u64,
    a: u64,
}

impl TryFrom<&str> for Header {
    type Error = ParserError;

    fn try_from(line: &str) -> std::result::Result<Self, Self::Error> {
        const FIELDS: [&str; 5] = [
            "number of variables",
            "number of PIs",
            "number of latches",
            "number of POs",
            "number of AIGs",
        ];
        let tokens = tokenize(line);

        match tokens.first() {
            None => {
                return Err(ParserError::MissingToken {
                    line: 1,
                    col: 1,
                    what: "aag",
                });
            }
            Some((_, "aag")) => (),
            Some((_, "aig")) => {
                return Err(ParserError::UnsupportedFeature(
                    "binary AIGER, only the ASCII format is supported".to_string(),
                ));
            }
            Some((_, token)) => {
                return Err(ParserError::InvalidToken {
                    line: 1,
                    what: "identifier",
                    token: token.to_string(),
                });
            }
        }

        let mut values = [0u64; 5];
        for (k, what) in FIELDS.into_iter().enumerate() {
            let (_, token) = tokens.get(k + 1).ok_or(ParserError::MissingToken {
                line: 1,
                col: line.len() + 1,
                what,
            })?;
            values[k] = read_u64(token, 1, what)?;
            if values[k] > MAX_LIT {
                return Err(ParserError::NumTooBig {
                    line: 1,
                    what,
                    value: values[k],
                });
            }
        }
        if let Some(&(col, token)) = tokens.get(6) {
            return Err(ParserError::ExtraToken {
                line: 1,
                col,
                token: token.to_string(),
            });
        }

        let [m, i, l, o, a] = values;
        if 2 * m + 1 > MAX_LIT {
            return Err(ParserError::NumTooBig {
                line: 1,
                what: "Number of variables",
                value: m,
            });
        }
        if m < i + l + a {
            return Err(ParserError::NumTooSmall {
                line: 1,
                what: "Number of variables",
                value: m,
            });
        }
        Ok(Header { m, i, l, o, a })
    }
}

/// Line oriented reader keeping track of the line number.
struct Parser<R> {
    lines: Lines<R>,
    line_no: usize,
    header: Header,
}

impl<R: BufRead> Parser<R> {
    fn next_line(&mut self) -> Result<Option<String>> {
        match self.lines.next() {
            None => Ok(None),
            Some(line) => {
                self.line_no += 1;
                let mut line = line?;
                if line.ends_with('\r') {
                    line.pop();
                }
                Ok(Some(line))
            }
        }
    }

    fn expect_line(&mut self, what: &'static str) -> Result<String> {
        self.next_line()?.ok_or_else(|| {
            ParserError::MissingDefinition {
                line: self.line_no + 1,
                what,
            }
            .into()
        })
    }

    /// Reads a line made of exactly `n` literals, returns them with their column.
    fn read_literals(&mut self, n: usize, what: &'static str) -> Result<Vec<(usize, u64)>> {
        let line = self.expect_line(what)?;
        let tokens = tokenize(&line);
        if tokens.len() < n {
            return Err(ParserError::MissingToken {
                line: self.line_no,
                col: line.len() + 1,
                what,
            }
            .into());
        }
        if let Some(&(col, token)) = tokens.get(n) {
            return Err(ParserError::ExtraToken {
                line: self.line_no,
                col,
                token: token.to_string(),
            }
            .into());
        }
        tokens
            .into_iter()
            .map(|(col, token)| -> Result<(usize, u64)> {
                Ok((col, read_u64(token, self.line_no, what)?))
            })
            .collect()
    }

    fn max_lit(&self) -> u64 {
        2 * self.header.m + 1
    }

    fn check_max_lit(&self, col: usize, lit: u64) -> Result<()> {
        if lit > self.max_lit() {
            return Err(ParserError::MaxLitId {
                line: self.line_no,
                col,
                lit,
            }
            .into());
        }
        Ok(())
    }

    /// Checks that `lit` can be the definition of a new PI or AIG gate.
    fn check_definition(&self, aig: &Aig, col: usize, lit: u64, what: &'static str) -> Result<()> {
        check_even(lit, self.line_no, col, what)?;
        if lit == 0 {
            return Err(ParserError::RedefConst {
                line: self.line_no,
                col,
                lit,
            }
            .into());
        }
        self.check_max_lit(col, lit)?;
        if let Some(previous) = aig.get_node((lit / 2) as NodeId) {
            if !previous.is_undefined() {
                return Err(ParserError::RedefGate {
                    line: self.line_no,
                    lit,
                    kind: previous.type_str(),
                    previous_line: previous.line(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn read_inputs(&mut self, aig: &mut Aig) -> Result<()> {
        for _ in 0..self.header.i {
            let lits = self.read_literals(1, "PI")?;
            let (col, lit) = lits[0];
            self.check_definition(aig, col, lit, "PI")?;
            aig.add_input((lit / 2) as NodeId, self.line_no)?;
        }
        Ok(())
    }

    /// Latches are checked, then dropped: their variables end up undefined.
    fn read_latches(&mut self, aig: &Aig) -> Result<()> {
        for _ in 0..self.header.l {
            let line = self.expect_line("latch")?;
            let tokens = tokenize(&line);
            if tokens.len() < 2 {
                return Err(ParserError::MissingToken {
                    line: self.line_no,
                    col: line.len() + 1,
                    what: "latch",
                }
                .into());
            }
            if let Some(&(col, token)) = tokens.get(3) {
                return Err(ParserError::ExtraToken {
                    line: self.line_no,
                    col,
                    token: token.to_string(),
                }
                .into());
            }
            let (col, lit) = tokens[0];
            let lit = read_u64(lit, self.line_no, "latch")?;
            self.check_definition(aig, col, lit, "latch")?;
            let (col, next) = tokens[1];
            self.check_max_lit(col, read_u64(next, self.line_no, "latch")?)?;
            log::warn!(
                "Line {}: latch {} ignored, only combinational circuits are supported",
                self.line_no,
                lit / 2
            );
        }
        Ok(())
    }

    fn read_outputs(&mut self, aig: &mut Aig) -> Result<()> {
        for _ in 0..self.header.o {
            let lits = self.read_literals(1, "PO")?;
            let (col, lit) = lits[0];
            self.check_max_lit(col, lit)?;
            aig.add_output(lit, self.line_no)?;
        }
        Ok(())
    }

    fn read_ands(&mut self, aig: &mut Aig) -> Result<()> {
        for _ in 0..self.header.a {
            let lits = self.read_literals(3, "AIG")?;
            let (col, lit) = lits[0];
            self.check_definition(aig, col, lit, "AIG")?;
            for &(col, fanin) in &lits[1..] {
                self.check_max_lit(col, fanin)?;
            }
            aig.add_and((lit / 2) as NodeId, lits[1].1, lits[2].1, self.line_no)?;
        }
        Ok(())
    }

    /// Symbols, then the optional comment section.
    fn read_symbols(&mut self, aig: &mut Aig) -> Result<()> {
        let mut seen_inputs = vec![false; self.header.i as usize];
        let mut seen_outputs = vec![false; self.header.o as usize];

        while let Some(line) = self.next_line()? {
            let Some(&(_, first)) = tokenize(&line).first() else {
                continue;
            };
            if line.trim() == "c" {
                let mut comment = Vec::new();
                while let Some(line) = self.next_line()? {
                    comment.push(line);
                }
                aig.set_comment(comment.join("\n"));
                return Ok(());
            }

            let mut chars = first.chars();
            let kind = chars.next().unwrap_or(' ');
            let (limit, what) = match kind {
                'i' => (self.header.i, "PI index"),
                'o' => (self.header.o, "PO index"),
                'l' => (self.header.l, "latch index"),
                _ => {
                    return Err(ParserError::IllegalSymbolType {
                        line: self.line_no,
                        token: kind.to_string(),
                    }
                    .into());
                }
            };
            let index = read_u64(chars.as_str(), self.line_no, "symbol index")?;
            if index >= limit {
                return Err(ParserError::NumTooBig {
                    line: self.line_no,
                    what,
                    value: index,
                }
                .into());
            }

            let name = line.trim_start()[first.len()..].trim_start();
            if name.is_empty() {
                return Err(ParserError::MissingToken {
                    line: self.line_no,
                    col: line.len() + 1,
                    what: "symbolic name",
                }
                .into());
            }
            if let Some(c) = name.chars().find(|c| c.is_control()) {
                return Err(ParserError::IllegalSymbolName {
                    line: self.line_no,
                    code: c as u32,
                }
                .into());
            }

            let seen = match kind {
                'i' => &mut seen_inputs[index as usize],
                'o' => &mut seen_outputs[index as usize],
                _ => continue,
            };
            if *seen {
                return Err(ParserError::RedefSymbol {
                    line: self.line_no,
                    kind,
                    index,
                }
                .into());
            }
            *seen = true;
            if kind == 'i' {
                aig.set_input_symbol(index as usize, name)?;
            } else {
                aig.set_output_symbol(index as usize, name)?;
            }
        }
        Ok(())
    }
}

impl Aig {
    /// Creates an AIG from a reader over an ASCII AIGER (.aag) description.
    ///
    /// Latches are accepted but ignored. Every diagnostic carries the line number
    /// (and the column when it makes sense), see [`ParserError`].
    pub fn from_ascii(reader: impl BufRead) -> Result<Self> {
        let mut lines = reader.lines();
        let header_line = match lines.next() {
            Some(line) => line?,
            None => {
                return Err(ParserError::MissingDefinition {
                    line: 1,
                    what: "header",
                }
                .into());
            }
        };
        let header = Header::try_from(header_line.trim_end_matches('\r'))?;
        let mut parser = Parser {
            lines,
            line_no: 1,
            header,
        };

        let mut aig = Aig::try_new(header.m as usize, header.o as usize).map_err(|e| {
            log::error!("cannot allocate {} nodes: {}", header.m + header.o + 1, e);
            ParserError::NumTooBig {
                line: 1,
                what: "Number of variables",
                value: header.m,
            }
        })?;
        parser.read_inputs(&mut aig)?;
        parser.read_latches(&aig)?;
        parser.read_outputs(&mut aig)?;
        parser.read_ands(&mut aig)?;
        parser.read_symbols(&mut aig)?;

        aig.rebuild();
        Ok(aig)
    }

    /// Same as [`Aig::from_ascii`], from a string.
    pub fn from_aag_str(s: &str) -> Result<Self> {
        Aig::from_ascii(s.as_bytes())
    }

    /// Creates an AIG from an .aag file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some("aag") => (),
            Some("aig") => {
                return Err(ParserError::UnsupportedFeature(
                    "binary AIGER, only the ASCII format is supported".to_string(),
                )
                .into());
            }
            _ => {
                return Err(
                    ParserError::Io("invalid extension, expected .aag".to_string()).into(),
                );
            }
        }
        let f = File::open(path.as_ref()).map_err(|z| ParserError::Io(z.to_string()))?;
        Aig::from_ascii(BufReader::new(f))
    }
}
