//! Interface de terminal do eventblast: barra de progresso e saída colorida.
//!
//! Usa as crates `indicatif` para a barra de progresso e `console` para
//! estilização com cores. O [`CampaignProgress`] acompanha visualmente
//! uma campanha no terminal.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::attempt::IdentityFields;
use crate::orchestrator::{Progress, ProgressSink};
use crate::proxy::ProxyCredential;
use crate::report::CampaignSummary;

/// Barra de progresso de uma campanha executada pela CLI.
///
/// Avança uma posição por job concluído e termina com um resumo
/// colorido: verde para sucessos, vermelho para falhas.
pub struct CampaignProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl CampaignProgress {
    pub fn start(total: usize) -> Self {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Cabeçalho impresso antes da campanha começar.
    pub fn print_banner(fields: &IdentityFields, identities: usize, targets: usize, proxies: usize, workers: usize) {
        let bold = Style::new().bold();
        println!("{}", bold.apply_to("─── eventblast campaign ───"));
        println!("  Name:          {} {}", fields.first_name, fields.last_name);
        println!("  Organization:  {}", fields.organization);
        println!("  Emails:        {identities}");
        println!("  Events:        {targets}");
        println!("  Total tasks:   {}", identities * targets);
        println!("  Proxies:       {proxies}");
        println!("  Workers:       {workers}");
        println!();
    }
}

impl ProgressSink for CampaignProgress {
    fn update(&self, p: &Progress) {
        self.pb.set_position(p.completed as u64);
        self.pb.set_message(format!(
            "{} ok / {} failed",
            p.succeeded,
            p.completed - p.succeeded
        ));
    }

    fn finish(&self, summary: &CampaignSummary) {
        self.pb.finish_and_clear();
        println!();
        println!("  {} Successful: {}", self.green.apply_to("✓"), summary.succeeded);
        println!("  {} Failed:     {}", self.red.apply_to("✗"), summary.failed);
        println!(
            "  {} Success rate {:.1}% | {:.1}s | {:.1} tasks/sec",
            self.yellow.apply_to("•"),
            summary.success_rate(),
            summary.duration.as_secs_f64(),
            summary.rate_per_sec(),
        );
    }
}

/// Lista os primeiros proxies carregados (modo `check`).
pub fn print_proxies(proxies: &[ProxyCredential]) {
    let yellow = Style::new().yellow();
    if proxies.is_empty() {
        println!("  {} No proxies configured", yellow.apply_to("!"));
        return;
    }
    println!("  {} proxies loaded", proxies.len());
    for (i, proxy) in proxies.iter().take(3).enumerate() {
        let kind = if proxy.is_authenticated() { "authenticated" } else { "anonymous" };
        println!("  {}. {} ({kind})", i + 1, proxy.server);
    }
}

/// Resultado da verificação de um alvo (modo `check`).
pub fn print_target_check(target: &str, outcome: Result<u16, String>) {
    match outcome {
        Ok(status) if (200..400).contains(&status) => {
            println!("  {} {target} (status {status})", Style::new().green().apply_to("✓"));
        }
        Ok(status) => {
            println!("  {} {target} (status {status})", Style::new().red().apply_to("✗"));
        }
        Err(reason) => {
            println!("  {} {target}: {reason}", Style::new().red().apply_to("✗"));
        }
    }
}
