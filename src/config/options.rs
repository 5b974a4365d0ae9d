use std::{str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// Транспорт соединения с хранилищем.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Network {
    #[default]
    Tcp,
    Unix,
}

impl FromStr for Network {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Network::Tcp),
            "unix" => Ok(Network::Unix),
            other => Err(SourceError::UnknownNetwork(other.to_string())),
        }
    }
}

/// Опции соединения, разобранные из строки источника.
///
/// Формат источника:
///
/// ```text
/// [network://]host:port?k1=v1&k2=v2&...&kn=vn
/// ```
///
/// network — `tcp` (по умолчанию) или `unix`. Распознаваемые ключи запроса:
/// `username`, `password`, `db`, `max_retries`, `pool_size`,
/// `min_idle_conns`, `prefix`, а также таймауты в миллисекундах:
/// `dial_timeout`, `read_timeout`, `write_timeout`, `pool_timeout`,
/// `idle_timeout`. Неизвестные ключи игнорируются.
///
/// Примеры:
///
/// ```text
/// 127.0.0.1:26379
/// tcp://127.0.0.1:26379
/// tcp://127.0.0.1:26379?db=1&username=foo&password=123456&prefix=mq
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Транспорт (tcp или unix).
    pub network: Network,
    /// Голый адрес `host:port`; именно он регистрируется в реестре тем.
    pub addr: String,
    /// Имя пользователя для аутентификации.
    pub username: String,
    /// Пароль для аутентификации.
    pub password: String,
    /// Индекс логической базы.
    pub db: i64,
    /// Максимум повторов команды на стороне клиента хранилища.
    pub max_retries: u32,
    /// Таймаут установления соединения.
    pub dial_timeout: Option<Duration>,
    /// Таймаут чтения.
    pub read_timeout: Option<Duration>,
    /// Таймаут записи.
    pub write_timeout: Option<Duration>,
    /// Таймаут ожидания свободного соединения в пуле.
    pub pool_timeout: Option<Duration>,
    /// Таймаут простоя соединения в пуле.
    pub idle_timeout: Option<Duration>,
    /// Размер пула соединений.
    pub pool_size: usize,
    /// Минимум простаивающих соединений в пуле.
    pub min_idle_conns: usize,
    /// Префикс имён каналов (тема без префикса публикуется как есть).
    pub prefix: String,
}

impl Options {
    /// Разбирает строку источника в `Options`.
    pub fn parse(source: &str) -> Result<Options, SourceError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(SourceError::Empty);
        }

        let mut options = Options::default();

        let rest = match source.split_once("://") {
            Some((scheme, rest)) => {
                options.network = scheme.parse()?;
                rest
            }
            None => source,
        };

        let (addr, query) = match rest.split_once('?') {
            Some((addr, query)) => (addr, Some(query)),
            None => (rest, None),
        };
        if addr.is_empty() {
            return Err(SourceError::MissingAddr);
        }
        options.addr = addr.to_string();

        if let Some(query) = query {
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                match key {
                    "username" => options.username = value.to_string(),
                    "password" => options.password = value.to_string(),
                    "prefix" => options.prefix = value.to_string(),
                    "db" => options.db = int_value(key, value)?,
                    "max_retries" => options.max_retries = int_value(key, value)?,
                    "pool_size" => options.pool_size = int_value(key, value)?,
                    "min_idle_conns" => options.min_idle_conns = int_value(key, value)?,
                    "dial_timeout" => options.dial_timeout = Some(ms_value(key, value)?),
                    "read_timeout" => options.read_timeout = Some(ms_value(key, value)?),
                    "write_timeout" => options.write_timeout = Some(ms_value(key, value)?),
                    "pool_timeout" => options.pool_timeout = Some(ms_value(key, value)?),
                    "idle_timeout" => options.idle_timeout = Some(ms_value(key, value)?),
                    // Неизвестные ключи не считаются ошибкой.
                    _ => {}
                }
            }
        }

        Ok(options)
    }
}

fn int_value<T: FromStr>(
    key: &str,
    value: &str,
) -> Result<T, SourceError> {
    value.parse().map_err(|_| SourceError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn ms_value(
    key: &str,
    value: &str,
) -> Result<Duration, SourceError> {
    int_value::<u64>(key, value).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Табличный тест разбора источника: сеть, адрес, учётные данные,
    /// база и признак ошибки.
    #[test]
    fn test_parse_source_table() {
        struct Case {
            source: &'static str,
            network: Network,
            addr: &'static str,
            db: i64,
            username: &'static str,
            password: &'static str,
            err: bool,
        }

        let cases = [
            Case {
                source: "127.0.0.1:26379",
                network: Network::Tcp,
                addr: "127.0.0.1:26379",
                db: 0,
                username: "",
                password: "",
                err: false,
            },
            Case {
                source: "tcp://127.0.0.1:26379",
                network: Network::Tcp,
                addr: "127.0.0.1:26379",
                db: 0,
                username: "",
                password: "",
                err: false,
            },
            Case {
                source: "unix://store.sock?db=1&username=foo&password=123456",
                network: Network::Unix,
                addr: "store.sock",
                db: 1,
                username: "foo",
                password: "123456",
                err: false,
            },
            Case {
                source: "127.0.0.1:26379?pool_size=NaN",
                network: Network::Tcp,
                addr: "",
                db: 0,
                username: "",
                password: "",
                err: true,
            },
            Case {
                source: "invalid://xxx",
                network: Network::Tcp,
                addr: "",
                db: 0,
                username: "",
                password: "",
                err: true,
            },
        ];

        for (i, tc) in cases.iter().enumerate() {
            match Options::parse(tc.source) {
                Ok(options) => {
                    assert!(!tc.err, "{i}: parse {} should have failed", tc.source);
                    assert_eq!(options.network, tc.network, "{i}: network");
                    assert_eq!(options.addr, tc.addr, "{i}: addr");
                    assert_eq!(options.db, tc.db, "{i}: db");
                    assert_eq!(options.username, tc.username, "{i}: username");
                    assert_eq!(options.password, tc.password, "{i}: password");
                }
                Err(err) => {
                    assert!(tc.err, "{i}: parse {} error: {err}", tc.source);
                }
            }
        }
    }

    /// Проверяет разбор таймаутов (миллисекунды) и префикса каналов.
    #[test]
    fn test_parse_timeouts_and_prefix() {
        let options =
            Options::parse("tcp://10.0.0.1:6379?dial_timeout=5000&read_timeout=250&prefix=mq")
                .unwrap();
        assert_eq!(options.dial_timeout, Some(Duration::from_millis(5000)));
        assert_eq!(options.read_timeout, Some(Duration::from_millis(250)));
        assert_eq!(options.write_timeout, None);
        assert_eq!(options.prefix, "mq");
    }

    /// Пустая строка и пропущенный адрес — ошибки построения.
    #[test]
    fn test_parse_empty_and_missing_addr() {
        assert_eq!(Options::parse("   "), Err(SourceError::Empty));
        assert_eq!(Options::parse("tcp://?db=1"), Err(SourceError::MissingAddr));
    }

    /// Неизвестные ключи запроса игнорируются, а не считаются ошибкой.
    #[test]
    fn test_parse_ignores_unknown_keys() {
        let options = Options::parse("127.0.0.1:6379?whatever=1&db=2").unwrap();
        assert_eq!(options.db, 2);
    }
}
