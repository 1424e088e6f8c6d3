use crate::models::{MarkedDate, StopwatchState, StreakState};
use crate::stopwatch::format_elapsed;
use crate::streak::marked_dates;
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;

pub fn render_streak_page(streak: &StreakState, today: NaiveDate, notice: Option<&str>) -> String {
    let notice_html = notice
        .map(|message| format!(r#"<p class="notice" id="notice">{message}</p>"#))
        .unwrap_or_default();

    page("Streak", STREAK_BODY)
        .replace("{{COUNT}}", &streak.count.to_string())
        .replace("{{NOTICE}}", &notice_html)
        .replace("{{MONTH}}", &today.format("%B %Y").to_string())
        .replace("{{CALENDAR}}", &render_calendar(today, &marked_dates(streak)))
}

pub fn render_timer_page(stopwatch: &StopwatchState) -> String {
    let toggle_label = if stopwatch.running { "Pause" } else { "Start" };
    page("Timer", TIMER_BODY)
        .replace("{{DISPLAY}}", &format_elapsed(stopwatch.elapsed_seconds))
        .replace("{{TOGGLE}}", toggle_label)
}

/// Month grid for the month containing `today`, weeks starting on Monday.
/// Days present in `marked` get the `checked` class and their color.
pub fn render_calendar(today: NaiveDate, marked: &BTreeMap<String, MarkedDate>) -> String {
    let first = today - Duration::days(i64::from(today.day0()));
    let mut html = String::from(r#"<table class="calendar"><thead><tr>"#);
    for label in ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"] {
        html.push_str(&format!("<th>{label}</th>"));
    }
    html.push_str("</tr></thead><tbody><tr>");

    let leading = first.weekday().num_days_from_monday();
    for _ in 0..leading {
        html.push_str("<td></td>");
    }

    let mut column = leading;
    for day in first.iter_days().take_while(|day| day.month() == first.month()) {
        if column == 7 {
            html.push_str("</tr><tr>");
            column = 0;
        }
        let key = day.format("%Y-%m-%d").to_string();
        let today_class = if day == today { " today" } else { "" };
        match marked.get(&key) {
            Some(mark) if mark.selected => {
                html.push_str(&format!(
                    r#"<td class="day checked{today_class}" data-date="{key}" style="background:{color}">{}</td>"#,
                    day.day(),
                    color = mark.selected_color,
                ));
            }
            _ => {
                html.push_str(&format!(
                    r#"<td class="day{today_class}" data-date="{key}">{}</td>"#,
                    day.day()
                ));
            }
        }
        column += 1;
    }

    for _ in column..7 {
        html.push_str("<td></td>");
    }
    html.push_str("</tr></tbody></table>");
    html
}

fn page(title: &str, body: &str) -> String {
    PAGE_HTML.replace("{{TITLE}}", title).replace("{{BODY}}", body)
}

const STREAK_BODY: &str = r#"
    <header>
      <h1>&#128293; You're on a <span id="count">{{COUNT}}</span>-day streak!</h1>
      <p class="subtitle">Check in once a day. Missing a day starts the streak over.</p>
    </header>

    {{NOTICE}}

    <section class="actions">
      <form method="post" action="/check-in">
        <button class="btn-primary" id="check-in-btn" type="submit">Check In Today</button>
      </form>
    </section>

    <section class="card">
      <h2>{{MONTH}}</h2>
      {{CALENDAR}}
    </section>

    <p class="hint"><a href="/timer">Open the stopwatch</a></p>
"#;

const TIMER_BODY: &str = r#"
    <header>
      <h1>Stopwatch</h1>
    </header>

    <section class="card">
      <span class="timer" id="display">{{DISPLAY}}</span>
    </section>

    <section class="actions">
      <form method="post" action="/timer/toggle">
        <button class="btn-primary" id="toggle-btn" type="submit">{{TOGGLE}}</button>
      </form>
      <form method="post" action="/timer/reset">
        <button class="btn-secondary" type="submit">Reset</button>
      </form>
    </section>

    <p class="hint"><a href="/">Back to streak</a></p>

    <script>
      const displayEl = document.getElementById('display');
      const toggleEl = document.getElementById('toggle-btn');

      const refresh = async () => {
        const res = await fetch('/api/stopwatch');
        if (!res.ok) {
          return;
        }
        const data = await res.json();
        displayEl.textContent = data.display;
        toggleEl.textContent = data.running ? 'Pause' : 'Start';
      };

      setInterval(() => refresh().catch(() => {}), 1000);
    </script>
"#;

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <style>
    :root {
      --bg: #ffffff;
      --ink: #2b2a28;
      --accent: #50cebb;
      --accent-2: #2f4858;
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.14);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 20px;
    }

    .app {
      width: min(640px, 100%);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 32px;
      display: grid;
      gap: 24px;
    }

    h1 {
      font-size: 24px;
      margin: 0 0 10px;
      text-align: center;
    }

    h2 {
      margin: 0 0 12px;
      font-size: 1.1rem;
    }

    .subtitle,
    .hint {
      margin: 0;
      color: #6f6a65;
      text-align: center;
    }

    .notice {
      margin: 0;
      padding: 12px 16px;
      border-radius: 14px;
      background: rgba(80, 206, 187, 0.15);
      text-align: center;
    }

    .card {
      border-radius: 20px;
      padding: 16px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      text-align: center;
    }

    .actions {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 16px;
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 14px 20px;
      font-size: 1rem;
      font-weight: 600;
      cursor: pointer;
      width: 100%;
      color: white;
    }

    .btn-primary {
      background: var(--accent);
    }

    .btn-secondary {
      background: var(--accent-2);
    }

    .calendar {
      width: 100%;
      border-collapse: separate;
      border-spacing: 4px;
    }

    .calendar th {
      font-size: 0.8rem;
      color: #8b857d;
    }

    .calendar td {
      height: 40px;
      border-radius: 50%;
      text-align: center;
    }

    .calendar td.checked {
      color: white;
      font-weight: 600;
    }

    .calendar td.today {
      outline: 2px solid var(--accent-2);
    }

    .timer {
      font-size: 48px;
      font-variant-numeric: tabular-nums;
    }
  </style>
</head>
<body>
  <main class="app">
{{BODY}}
  </main>
</body>
</html>
"#;
