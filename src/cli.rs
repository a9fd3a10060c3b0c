//! Interface de linha de comando do eventblast baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (run, bot, check)
//! e flags globais (--config, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_FILE;

/// eventblast: inscrições em massa em páginas de eventos.
#[derive(Debug, Parser)]
#[command(name = "eventblast", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Arquivo de configuração TOML.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Executa uma campanha e espera o término.
    Run {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        organization: String,

        /// Um email por linha (aceita links markdown).
        #[arg(long, default_value = "emails.txt")]
        emails: PathBuf,

        /// Uma URL de evento por linha.
        #[arg(long, default_value = "list.txt")]
        events: PathBuf,

        /// Lista de proxies; se ausente, a campanha roda sem proxy.
        #[arg(long)]
        proxies: Option<PathBuf>,

        /// Workers concorrentes (padrão: `default_workers` da configuração).
        #[arg(long, short)]
        workers: Option<usize>,

        /// Modo visível: registra cada tentativa no log.
        #[arg(long, default_value_t = false)]
        window: bool,

        /// Chat do Telegram que recebe os alertas de falha.
        #[arg(long, allow_negative_numbers = true)]
        telegram: Option<i64>,

        /// Latência simulada por tentativa, em milissegundos.
        #[arg(long, default_value_t = 0)]
        latency_ms: u64,
    },

    /// Inicia o bot do Telegram (plano de controle).
    Bot,

    /// Verifica proxies e URLs de eventos sem registrar nada.
    Check {
        #[arg(long)]
        proxies: Option<PathBuf>,

        #[arg(long, default_value = "list.txt")]
        events: PathBuf,
    },
}
