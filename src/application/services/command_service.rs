use crate::application::messaging::format::usage_help;
use crate::domain::entities::{Command, CommandKind, CommandRegistry};

/// Service for managing the chat command set
pub struct CommandService {
    registry: CommandRegistry,
    prefix: String,
}

impl CommandService {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            registry: CommandRegistry::new(),
            prefix: prefix.into(),
        }
    }

    pub fn register(&mut self, command: Command) {
        tracing::debug!("Registering command {}{}", self.prefix, command.name);
        self.registry.register(command);
    }

    pub fn register_defaults(&mut self) {
        self.register(Command::new("help", CommandKind::Help)
            .with_description("Tampilkan daftar perintah")
            .with_aliases(["h", "bantuan"])
            .with_usage("help [perintah]")
            .with_example("help newmatch"));

        self.register(Command::new("newmatch", CommandKind::NewMatch)
            .with_description("Buat pertandingan baru")
            .with_aliases(["nm", "buatmatch"])
            .with_usage("newmatch <olahraga> <venue> <harga per orang> [--max N]")
            .with_example("newmatch Futsal \"Lapangan A\" 50000 --max 10"));

        self.register(Command::new("join", CommandKind::Join)
            .with_description("Ikut pertandingan")
            .with_aliases(["j"])
            .with_usage("join [nomor]")
            .with_example("join 1"));

        self.register(Command::new("leave", CommandKind::Leave)
            .with_description("Keluar dari pertandingan")
            .with_aliases(["l", "keluar"])
            .with_usage("leave [nomor]")
            .with_example("leave 1"));

        self.register(Command::new("listmatch", CommandKind::ListMatch)
            .with_description("Lihat daftar pertandingan")
            .with_aliases(["lm", "daftarmatch"])
            .with_usage("listmatch"));

        self.register(Command::new("status", CommandKind::Status)
            .with_description("Detail pertandingan dan pesertanya")
            .with_aliases(["s", "detail"])
            .with_usage("status [nomor]")
            .with_example("status 2"));

        self.register(Command::new("endmatch", CommandKind::EndMatch)
            .with_description("Selesaikan pertandingan dan tagih peserta")
            .with_aliases(["em", "selesai"])
            .with_usage("endmatch [nomor]")
            .with_example("endmatch 1"));

        self.register(Command::new("kas", CommandKind::Kas)
            .with_description("Lihat saldo kas grup")
            .with_aliases(["saldo"])
            .with_usage("kas"));

        self.register(Command::new("historykas", CommandKind::HistoryKas)
            .with_description("Lihat riwayat transaksi kas")
            .with_aliases(["hk", "riwayat"])
            .with_usage("historykas [jumlah]")
            .with_example("historykas 5"));
    }

    pub fn find(&self, name: &str) -> Option<&Command> {
        self.registry.find(name)
    }

    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.registry.all()
    }

    pub fn get_help(&self, command: Option<&str>) -> String {
        if let Some(name) = command {
            let name = name.trim_start_matches(self.prefix.as_str());
            if let Some(cmd) = self.registry.find(name) {
                return usage_help(cmd, &self.prefix);
            }
            return format!("❌ Perintah {}{} tidak ditemukan", self.prefix, name);
        }

        let mut help = "📋 *Daftar Perintah*\n".to_string();
        for cmd in self.registry.all() {
            help.push_str(&format!(
                "\n{}{} - {}",
                self.prefix,
                cmd.name,
                cmd.description.as_deref().unwrap_or("")
            ));
        }
        help.push_str(&format!("\n\nKetik {}help <perintah> untuk detail", self.prefix));
        help
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}
