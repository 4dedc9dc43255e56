/// 명시적 권한 검사
/// 프레임워크 디스패치 대신 핸들러가 변경 커맨드 실행 전에 직접 호출하는
/// 검사 함수. 결과는 태그된 값으로 반환된다.

/// 접근 판정 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Forbidden,
    NotFound,
}

/// 소유자 전용 접근 검사
/// 대상 리소스가 없으면 NotFound, 소유자가 아니면 Forbidden.
pub fn check_owner(resource_owner: Option<i64>, user_id: i64) -> Access {
    match resource_owner {
        None => Access::NotFound,
        Some(owner) if owner == user_id => Access::Allowed,
        Some(_) => Access::Forbidden,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_is_allowed() {
        assert_eq!(check_owner(Some(1), 1), Access::Allowed);
    }

    #[test]
    fn non_owner_is_forbidden() {
        assert_eq!(check_owner(Some(1), 2), Access::Forbidden);
    }

    #[test]
    fn missing_resource_is_not_found() {
        assert_eq!(check_owner(None, 1), Access::NotFound);
    }
}
