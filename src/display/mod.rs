/// 표시용 포매터
/// 카운트다운 문자열과 파키스탄 시장 관례의 가격 축약 라벨을 만든다.
/// 상태가 없으며 렌더링하는 쪽 어디서든 호출할 수 있다.
// region:    --- Imports
use crate::clock::TimeRemaining;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Countdown

/// 만료된 목표 시각에 대한 고정 표기
pub const TIME_EXPIRED: &str = "Time expired";

/// 남은 시간 표기: "{d}d {h}h {m}m {s}s"
pub fn format_countdown(remaining: &TimeRemaining) -> String {
    match remaining {
        TimeRemaining::Expired => TIME_EXPIRED.to_string(),
        TimeRemaining::Remaining {
            days,
            hours,
            minutes,
            seconds,
            ..
        } => format!("{}d {}h {}m {}s", days, hours, minutes, seconds),
    }
}

// endregion: --- Countdown

// region:    --- Price Label

/// 가격 라벨 도메인 오류
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PriceFormatError {
    /// 0 이하의 금액은 라벨을 만들 수 없다
    #[error("invalid or missing price: {0}")]
    InvalidAmount(i64),
    /// 자릿수 표가 지원하는 범위(100 ~ 99 crore) 밖의 금액
    #[error("unsupported price range: {digits} digits")]
    UnsupportedRange { digits: usize },
}

/// 금액을 자릿수 기준 표에 따라 축약 라벨로 변환
/// 3~5자리는 Hundred/Thousand + 나머지, 6~7자리는 Lac, 8~10자리는 Crore.
/// Lac/Crore 구간은 선행 자릿수를 100으로 나눠 소수 둘째 자리까지 표기한다.
pub fn format_price(amount: i64) -> Result<String, PriceFormatError> {
    if amount <= 0 {
        return Err(PriceFormatError::InvalidAmount(amount));
    }

    let digits_str = amount.to_string();
    let digits = digits_str.len();

    let label = match digits {
        // 100 ~ 999
        3 => {
            let hundreds = amount / 100;
            let remainder = amount % 100;
            with_remainder(format!("{} Hundred", hundreds), remainder)
        }
        // 1,000 ~ 99,999
        4 | 5 => {
            let thousands = amount / 1000;
            let remainder = amount % 1000;
            with_remainder(format!("{} Thousand", thousands), remainder)
        }
        // 100,000 ~ 9,999,999 (Lac)
        6 => leading_band(&digits_str, 3, "Lac"),
        7 => leading_band(&digits_str, 4, "Lac"),
        // 10,000,000 ~ 9,999,999,999 (Crore)
        8 => leading_band(&digits_str, 3, "Crore"),
        9 => leading_band(&digits_str, 4, "Crore"),
        10 => leading_band(&digits_str, 5, "Crore"),
        _ => return Err(PriceFormatError::UnsupportedRange { digits }),
    };

    Ok(label)
}

/// 나머지 금액이 있으면 " and {r}"를 덧붙인다
fn with_remainder(base: String, remainder: i64) -> String {
    if remainder > 0 {
        format!("{} and {}", base, remainder)
    } else {
        base
    }
}

/// 선행 자릿수를 잘라 100으로 나눈 값을 소수 둘째 자리까지 표기
fn leading_band(digits_str: &str, take: usize, unit: &str) -> String {
    // 자릿수 검사를 통과했으므로 선행 구간은 항상 존재한다
    let leading: i64 = digits_str[..take].parse().unwrap_or(0);
    format!("{:.2} {}", leading as f64 / 100.0, unit)
}

// endregion: --- Price Label
