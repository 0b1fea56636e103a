//! Reply texts. Output uses the HTML markup subset (`<b>`, `<code>`), so every
//! user-provided name goes through [`escape_html`].

use std::fmt::Write;

use pushup_domain::challenge::DayInfo;
use pushup_domain::config::BotConfig;
use pushup_domain::user::UserRecord;
use pushup_domain::{ChatId, UserId};

pub const DEFAULT_COMMENT: &str = "Продолжай в том же духе!";
pub const FAILED_COMMENT: &str = "Сила в постоянстве.";

const TOP_TOTAL_LIMIT: usize = 5;
const NEVER_REPORTED_LIMIT: usize = 10;

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn mention(name: &str) -> String {
    format!("@{}", escape_html(name))
}

pub fn start() -> String {
    "Привет! Отправь мне количество отжиманий или используй /help.".to_string()
}

pub fn help() -> String {
    [
        "📋 Команды:",
        "/mystats — ваша личная статистика",
        "/stats — статистика всей группы",
        "/changemydailystats N — изменить количество за сегодня",
        "/setgroup — назначить эту группу основной",
        "/config — показать текущую конфигурацию",
        "/adminstats — статистика для администраторов",
        "",
        "Пример отчёта: 25+25+25=75",
    ]
    .join("\n")
}

pub fn report_accepted(name: &str, pushups_today: u32, group_today: u64, comment: &str) -> String {
    format!(
        "✅ {}: {} отжиманий за сегодня.\n💪 Группа: {} сегодня.\n\n{}",
        mention(name),
        pushups_today,
        group_today,
        escape_html(comment)
    )
}

pub fn no_stats() -> String {
    "У вас пока нет статистики. Отправьте отчёт, чтобы начать!".to_string()
}

pub fn my_stats(user: &UserRecord, day: DayInfo, comment: Option<&str>) -> String {
    let mut text = format!(
        "📊 {}\nСегодня: {} отжиманий\nВсего: {} отжиманий\nДень челленджа: #{} (осталось {})",
        mention(user.username()),
        user.pushups_today(),
        user.total_pushups(),
        day.day_number,
        day.days_remaining
    );
    if let Some(comment) = comment {
        let _ = write!(text, "\n\n{}", escape_html(comment));
    }
    text
}

pub fn group_stats(
    total_today: u64,
    total_all: u64,
    day: DayInfo,
    ranking: &[(UserId, &UserRecord)],
    comment: Option<&str>,
) -> String {
    let mut text = format!(
        "📈 Сегодня группа сделала: {} отжиманий\n🏆 Всего: {} отжиманий\n📅 День челленджа: #{}\n",
        total_today, total_all, day.day_number
    );

    if !ranking.is_empty() {
        text.push_str("\n🔥 Топ за сегодня:\n");
        for (i, (_, user)) in ranking.iter().enumerate() {
            let _ = writeln!(
                text,
                "{}. {}: {}",
                i + 1,
                mention(user.username()),
                user.pushups_today()
            );
        }
    }

    if let Some(comment) = comment {
        let _ = write!(text, "\n{}", escape_html(comment));
    }
    text
}

pub fn change_usage() -> String {
    "Укажите новое количество отжиманий. Пример: /changemydailystats 100".to_string()
}

pub fn changed(old: u32, new: u32) -> String {
    format!("Изменено: {} ➡️ {} отжиманий.", old, new)
}

pub fn groups_only() -> String {
    "Эта команда работает только в группах.".to_string()
}

pub fn group_set(chat_id: ChatId) -> String {
    format!("Группа настроена! chat_id: <code>{}</code>", chat_id)
}

pub fn config(config: &BotConfig) -> String {
    let chat_id = config
        .chat_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "не задан".to_string());

    format!(
        "🛠 <b>Текущая конфигурация:</b>\nChat ID: <code>{}</code>\nНапоминание: <b>{}</b>\nПредупреждение: {} дн\nУдаление: {} дн\nЧеллендж: {} → {}",
        chat_id,
        config.reminder_time,
        config.warning_days,
        config.inactivity_days,
        config.challenge_start_date,
        config.challenge_end_date
    )
}

pub fn admins_only() -> String {
    "⛔ Эта команда доступна только администраторам.".to_string()
}

pub fn admin_unverifiable() -> String {
    "Не удалось проверить статус администратора.".to_string()
}

/// Figures shown by `/adminstats`
pub struct AdminSummary<'a> {
    pub total_users: usize,
    pub active_today: usize,
    pub inactive: usize,
    pub inactivity_days: u32,
    pub never_reported: Vec<&'a UserRecord>,
    pub top_total: Vec<(UserId, &'a UserRecord)>,
}

pub fn admin_stats(summary: &AdminSummary<'_>) -> String {
    let mut text = format!(
        "<b>📊 Админ-статистика:</b>\nВсего участников: <b>{}</b>\nАктивны сегодня: <b>{}</b>\nНеактивны {}+ дней: <b>{}</b>\n\n",
        summary.total_users, summary.active_today, summary.inactivity_days, summary.inactive
    );

    if !summary.never_reported.is_empty() {
        text.push_str("❗ Никогда не отчитывались:\n");
        for user in summary.never_reported.iter().take(NEVER_REPORTED_LIMIT) {
            let _ = writeln!(text, "• {}", mention(user.username()));
        }
        text.push('\n');
    }

    if !summary.top_total.is_empty() {
        text.push_str("🏆 Топ-5 по всем временам:\n");
        for (i, (_, user)) in summary.top_total.iter().take(TOP_TOTAL_LIMIT).enumerate() {
            let _ = writeln!(
                text,
                "{}. {}: {} отж.",
                i + 1,
                mention(user.username()),
                user.total_pushups()
            );
        }
    }

    text
}

pub fn welcome(name: &str) -> String {
    format!(
        "👋 Добро пожаловать, {}!\nНе забудь отчитаться сегодня! Пример: 25+25+25=75\nКоманды: /mystats, /stats",
        mention(name)
    )
}

pub fn reminder(day: DayInfo) -> String {
    format!(
        "⏰ Напоминание!\nСегодня день #{} челленджа. Осталось {} дн.\nНе забудьте отчитаться о своих отжиманиях сегодня.\nПример: 25+25+25+25=100",
        day.day_number, day.days_remaining
    )
}

pub fn inactivity_warning(name: &str, warning_days: u32, days_left: u32) -> String {
    format!(
        "⚠️ {}, вы не отчитывались уже {} дня.\nЕсли не будет активности ещё {} дн., вы будете исключены.",
        mention(name),
        warning_days,
        days_left
    )
}

pub fn removed_for_inactivity(name: &str) -> String {
    format!("⛔ {} исключён из группы за неактивность.", mention(name))
}

/// Prompt for the motivational line after a report
pub fn report_comment_prompt(name: &str, pushups_today: u32) -> String {
    format!(
        "Дай краткий мотивирующий комментарий для @{}, который отжался {} раз сегодня.",
        name, pushups_today
    )
}

pub fn personal_comment_prompt(name: &str, total: u32, day: DayInfo) -> String {
    format!(
        "@{} сделал {} отжиманий за {} дней челленджа, осталось {} дней. Дай короткое напутствие.",
        name, total, day.day_number, day.days_remaining
    )
}

pub fn daily_stats_comment_prompt(total_today: u64, reporters: usize) -> String {
    format!(
        "Сегодня {} участников сделали вместе {} отжиманий. Подведи итог дня одной фразой.",
        reporters, total_today
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn user(name: &str, today: u32, total: u32) -> UserRecord {
        let date = NaiveDate::from_ymd_opt(2025, 4, 2).unwrap();
        UserRecord::restore(
            name.to_string(),
            Some(date.and_hms_opt(9, 0, 0).unwrap()),
            today,
            Some(date),
            total,
        )
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>&co</b>"), "&lt;b&gt;&amp;co&lt;/b&gt;");
        assert_eq!(escape_html("иван_42"), "иван_42");
    }

    #[test]
    fn test_report_accepted_escapes_name() {
        let text = report_accepted("<script>", 40, 120, DEFAULT_COMMENT);
        assert!(text.starts_with("✅ @&lt;script&gt;: 40 отжиманий за сегодня."));
        assert!(text.contains("💪 Группа: 120 сегодня."));
        assert!(text.ends_with(DEFAULT_COMMENT));
    }

    #[test]
    fn test_group_stats_lists_ranking() {
        let a = user("anna", 80, 100);
        let b = user("boris", 50, 500);
        let ranking = vec![(UserId::new(1), &a), (UserId::new(2), &b)];
        let day = DayInfo {
            day_number: 19,
            days_remaining: 71,
        };

        let text = group_stats(130, 600, day, &ranking, None);

        assert!(text.contains("📈 Сегодня группа сделала: 130 отжиманий"));
        assert!(text.contains("📅 День челленджа: #19"));
        assert!(text.contains("1. @anna: 80\n2. @boris: 50"));
    }

    #[test]
    fn test_group_stats_without_reports() {
        let day = DayInfo {
            day_number: 1,
            days_remaining: 89,
        };
        let text = group_stats(0, 0, day, &[], None);
        assert!(!text.contains("Топ"));
    }

    #[test]
    fn test_admin_stats_truncates_lists() {
        let never: Vec<UserRecord> = (0..12).map(|i| user(&format!("u{i}"), 0, 0)).collect();
        let summary = AdminSummary {
            total_users: 12,
            active_today: 0,
            inactive: 3,
            inactivity_days: 4,
            never_reported: never.iter().collect(),
            top_total: never
                .iter()
                .enumerate()
                .map(|(i, u)| (UserId::new(i as i64), u))
                .collect(),
        };

        let text = admin_stats(&summary);

        assert!(text.contains("Неактивны 4+ дней: <b>3</b>"));
        assert!(text.contains("• @u9\n"));
        assert!(!text.contains("• @u10"));
        assert!(text.contains("5. @u4: 0 отж."));
        assert!(!text.contains("6. @u5"));
    }

    #[test]
    fn test_config_without_chat() {
        let cfg = BotConfig::new(
            "22:00".parse().unwrap(),
            4,
            2,
            NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 13).unwrap(),
        )
        .unwrap();

        let text = config(&cfg);

        assert!(text.contains("Chat ID: <code>не задан</code>"));
        assert!(text.contains("Напоминание: <b>22:00</b>"));
        assert!(text.contains("Челлендж: 2025-03-15 → 2025-06-13"));
    }

    #[test]
    fn test_warning_mentions_grace_period() {
        let text = inactivity_warning("olga", 2, 2);
        assert!(text.starts_with("⚠️ @olga, вы не отчитывались уже 2 дня."));
        assert!(text.contains("ещё 2 дн."));
    }
}
