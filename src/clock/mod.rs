/// 시계 / 타임존 서비스
/// 경매 상태 전이 판정은 항상 절대 시각(UTC)으로 비교하고,
/// 고정 기준 시간대(Asia/Karachi, UTC+05:00)는 화면 표시용으로만 사용한다.
// region:    --- Imports
use chrono::{DateTime, FixedOffset, Utc};

// endregion: --- Imports

// region:    --- Clock Trait

/// 현재 시각 공급자
/// 스케줄러와 테스트가 같은 경로로 시각을 주입받기 위한 트레이트
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 시스템 시계
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// endregion: --- Clock Trait

// region:    --- Time Remaining

/// 두 시각 사이의 남은 시간 분해 결과
/// 목표 시각이 이미 지난 경우 음수 대신 `Expired`를 반환한다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeRemaining {
    Expired,
    Remaining {
        days: i64,
        hours: i64,
        minutes: i64,
        seconds: i64,
        total_seconds: i64,
    },
}

/// 남은 시간 분해
/// 밀리초 차이를 내림 나눗셈으로 일/시/분/초로 분해한다.
/// 부수 효과가 없으며 어떤 시각을 주입해도 결정적으로 동작한다.
pub fn breakdown(from: DateTime<Utc>, to: DateTime<Utc>) -> TimeRemaining {
    let diff_ms = to.timestamp_millis() - from.timestamp_millis();
    if diff_ms <= 0 {
        return TimeRemaining::Expired;
    }

    let total_seconds = diff_ms / 1000;
    let days = total_seconds / (3600 * 24);
    let hours = (total_seconds % (3600 * 24)) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    TimeRemaining::Remaining {
        days,
        hours,
        minutes,
        seconds,
        total_seconds,
    }
}

// endregion: --- Time Remaining

// region:    --- Civil Time

/// 기준 시간대 오프셋 (Asia/Karachi, 파키스탄은 DST 미적용)
const KARACHI_UTC_OFFSET_SECS: i32 = 5 * 3600;

/// 절대 시각을 기준 시간대의 `YYYY-MM-DDTHH:mm` 문자열로 변환
/// 표시 전용이며 상태 전이 비교에는 사용하지 않는다.
pub fn format_karachi(instant: DateTime<Utc>) -> String {
    // 오프셋이 상수 범위 안에 있으므로 실패하지 않는다
    let offset = FixedOffset::east_opt(KARACHI_UTC_OFFSET_SECS).unwrap();
    instant
        .with_timezone(&offset)
        .format("%Y-%m-%dT%H:%M")
        .to_string()
}

// endregion: --- Civil Time
