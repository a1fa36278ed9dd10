//! User-facing text
//!
//! Everything the bot says lives here so transports only relay strings.

use crate::Settlement;

/// Renders prompts, corrections and the settlement report
#[derive(Debug, Clone)]
pub struct Messages {
    currency_symbol: String,
}

impl Messages {
    pub fn new(currency_symbol: impl Into<String>) -> Self {
        Self {
            currency_symbol: currency_symbol.into(),
        }
    }

    pub fn greeting(&self) -> String {
        "Привет! Я помогу рассчитать долги между друзьями.\nСколько человек участвует?".into()
    }

    pub fn invalid_number(&self) -> String {
        "Пожалуйста, введи число!".into()
    }

    pub fn too_few_participants(&self, min: u32) -> String {
        format!(
            "Должно быть минимум {} {}!",
            min,
            participants_word(u64::from(min))
        )
    }

    pub fn too_many_participants(&self, max: u32) -> String {
        format!(
            "Можно не больше {} {}!",
            max,
            participants_word(u64::from(max))
        )
    }

    pub fn expenses_format(&self) -> String {
        "Отлично! Теперь введи траты в формате:\n\
         Имя: Сумма\n\n\
         Пример:\n\
         Вася: 1000\n\
         Петя: 500\n\
         Маша: 600"
            .into()
    }

    pub fn count_mismatch(&self, expected: u32) -> String {
        format!(
            "Ожидалось {} {}!\nПожалуйста, введи данные заново.",
            expected,
            participants_word(u64::from(expected))
        )
    }

    pub fn cancelled(&self) -> String {
        "Диалог отменен".into()
    }

    pub fn no_session(&self) -> String {
        "Чтобы начать расчет, отправь /start".into()
    }

    pub fn session_finished(&self) -> String {
        "Расчет уже завершен. Чтобы начать заново, отправь /start".into()
    }

    /// The final report: totals, then transfers grouped by creditor
    pub fn report(&self, settlement: &Settlement) -> String {
        let mut out = format!(
            "💸 Общая сумма затрат: {}\n🧮 Cумма на одного участника: {}\n\n",
            self.money(settlement.total),
            self.money(settlement.average)
        );

        if settlement.is_even() {
            out.push_str("🤝 Все заплатили поровну, никто никому не должен.\n");
            return out;
        }

        out.push_str("📊 Результаты расчетов:\n");
        for group in settlement.by_creditor() {
            out.push_str(&format!("🔹 {}:\n", group.creditor));
            for transfer in group.transfers {
                out.push_str(&format!(
                    "   • {} → {}: {}\n",
                    transfer.debtor,
                    transfer.creditor,
                    self.money(transfer.amount)
                ));
            }
            out.push('\n');
        }

        out
    }

    fn money(&self, amount: f64) -> String {
        format!("{} {}", format_amount(amount), self.currency_symbol)
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self::new("₽")
    }
}

/// Two-decimal rendering used for every amount in the report
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// "участник" in the form that agrees with `n`
fn participants_word(n: u64) -> &'static str {
    match (n % 10, n % 100) {
        (1, m) if m != 11 => "участник",
        (2..=4, m) if !(12..=14).contains(&m) => "участника",
        _ => "участников",
    }
}
