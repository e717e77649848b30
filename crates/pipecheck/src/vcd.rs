use crate::signal::Probe;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Value change dump of every traced bus signal.
pub struct VcdWriter<W: Write = BufWriter<File>> {
    writer: W,
    ids: Vec<String>,
    last_values: Vec<Option<u64>>,
    timestamp: u64,
}

impl VcdWriter {
    pub fn create<P: AsRef<Path>>(path: P, scope: &str, probes: &[Probe]) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), scope, probes)
    }
}

impl<W: Write> VcdWriter<W> {
    pub fn new(mut writer: W, scope: &str, probes: &[Probe]) -> std::io::Result<Self> {
        // VCD Header
        writeln!(writer, "$date")?;
        writeln!(
            writer,
            "  {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(writer, "$end")?;
        writeln!(writer, "$version")?;
        writeln!(writer, "  pipecheck {}", env!("CARGO_PKG_VERSION"))?;
        writeln!(writer, "$end")?;
        writeln!(writer, "$timescale 1ps $end")?;

        writeln!(writer, "$scope module {} $end", scope)?;
        let mut ids = Vec::with_capacity(probes.len());
        for (num, probe) in probes.iter().enumerate() {
            let vcd_id = Self::generate_vcd_id(num);
            writeln!(
                writer,
                "$var wire {} {} {} $end",
                probe.width, vcd_id, probe.name
            )?;
            ids.push(vcd_id);
        }
        writeln!(writer, "$upscope $end")?;
        writeln!(writer, "$enddefinitions $end")?;

        Ok(Self {
            writer,
            last_values: vec![None; ids.len()],
            ids,
            timestamp: 0,
        })
    }

    fn generate_vcd_id(num: usize) -> String {
        let mut id = String::new();
        let mut n = num;
        loop {
            let char = ((n % 94) + 33) as u8 as char;
            id.push(char);
            if n < 94 {
                break;
            }
            n = (n / 94) - 1;
        }
        id.chars().rev().collect()
    }

    /// Writes the values that changed since the previous dump. `probes`
    /// must list the same signals, in the same order, as at construction.
    pub fn dump(&mut self, timestamp: u64, probes: &[Probe]) -> std::io::Result<()> {
        let first = self.last_values.iter().all(Option::is_none);
        if timestamp > self.timestamp || first {
            writeln!(self.writer, "#{}", timestamp)?;
            self.timestamp = timestamp;
        }
        if first {
            writeln!(self.writer, "$dumpvars")?;
        }

        for ((probe, vcd_id), last) in probes
            .iter()
            .zip(&self.ids)
            .zip(self.last_values.iter_mut())
        {
            if *last == Some(probe.value) {
                continue;
            }
            if probe.width == 1 {
                writeln!(self.writer, "{}{}", probe.value & 1, vcd_id)?;
            } else {
                writeln!(self.writer, "b{:b} {}", probe.value, vcd_id)?;
            }
            *last = Some(probe.value);
        }

        if first {
            writeln!(self.writer, "$end")?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> std::fmt::Debug for VcdWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VcdWriter")
            .field("signals", &self.ids.len())
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probes(a: u64, b: u64) -> Vec<Probe> {
        vec![
            Probe {
                name: "in.bit",
                width: 1,
                value: a,
            },
            Probe {
                name: "in.word",
                width: 32,
                value: b,
            },
        ]
    }

    #[test]
    fn header_declares_every_probe() {
        let vcd = VcdWriter::new(Vec::new(), "vif", &probes(0, 0)).unwrap();
        let text = String::from_utf8(vcd.into_inner()).unwrap();
        assert!(text.contains("$timescale 1ps $end"));
        assert!(text.contains("$scope module vif $end"));
        assert!(text.contains("$var wire 1 ! in.bit $end"));
        assert!(text.contains("$var wire 32 \" in.word $end"));
    }

    #[test]
    fn only_changed_values_are_dumped() {
        let mut vcd = VcdWriter::new(Vec::new(), "vif", &probes(0, 0)).unwrap();
        vcd.dump(0, &probes(0, 5)).unwrap();
        vcd.dump(10, &probes(1, 5)).unwrap();
        let text = String::from_utf8(vcd.into_inner()).unwrap();
        let body = text.split("$enddefinitions $end\n").nth(1).unwrap();
        assert_eq!(body, "#0\n$dumpvars\n0!\nb101 \"\n$end\n#10\n1!\n");
    }

    #[test]
    fn ids_roll_over_to_two_characters() {
        assert_eq!(VcdWriter::<Vec<u8>>::generate_vcd_id(0), "!");
        assert_eq!(VcdWriter::<Vec<u8>>::generate_vcd_id(93), "~");
        assert_eq!(VcdWriter::<Vec<u8>>::generate_vcd_id(94), "!!");
    }
}
