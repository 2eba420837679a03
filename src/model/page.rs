use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortProperty {
    Id,
    Name,
}

impl SortProperty {
    pub fn column(&self) -> &'static str {
        match self {
            SortProperty::Id => "id",
            SortProperty::Name => "name",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn keyword(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub property: SortProperty,
    pub direction: Direction,
}

/// Sort on at most one property, `None` when unsorted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort(pub Option<SortOrder>);

impl Sort {
    pub fn unsorted() -> Self {
        Self(None)
    }

    pub fn by(property: SortProperty, direction: Direction) -> Self {
        Self(Some(SortOrder {
            property,
            direction,
        }))
    }

    pub fn is_unsorted(&self) -> bool {
        self.0.is_none()
    }

    pub fn order(&self) -> Option<SortOrder> {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid sort parameter: {0}")]
pub struct SortParseError(pub String);

/// Parses `property[,asc|desc]`, e.g. `name,desc`
impl FromStr for Sort {
    type Err = SortParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',').map(str::trim);

        let property = match parts.next() {
            Some("id") => SortProperty::Id,
            Some("name") => SortProperty::Name,
            Some("") | None => return Ok(Sort::unsorted()),
            Some(other) => return Err(SortParseError(format!("unknown property '{}'", other))),
        };

        let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => Direction::Asc,
            Some("desc") => Direction::Desc,
            Some(other) => {
                return Err(SortParseError(format!("unknown direction '{}'", other)));
            }
        };

        if parts.next().is_some() {
            return Err(SortParseError(s.to_string()));
        }

        Ok(Sort::by(property, direction))
    }
}

/// Requested page: zero-based page number, page size and sort order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: Sort,
}

impl PageRequest {
    pub fn of(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            sort: Sort::unsorted(),
        }
    }

    pub fn with_sort(page: u32, size: u32, sort: Sort) -> Self {
        Self { page, size, sort }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// One page of results plus the metadata needed to walk the rest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        let total_pages = if request.size == 0 {
            0
        } else {
            total_elements.div_ceil(u64::from(request.size))
        };

        Self {
            content,
            number: request.page,
            size: request.size,
            total_elements,
            total_pages,
        }
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parsing() {
        assert_eq!("".parse::<Sort>().unwrap(), Sort::unsorted());
        assert_eq!(
            "name".parse::<Sort>().unwrap(),
            Sort::by(SortProperty::Name, Direction::Asc)
        );
        assert_eq!(
            "id,DESC".parse::<Sort>().unwrap(),
            Sort::by(SortProperty::Id, Direction::Desc)
        );
        assert!("age,asc".parse::<Sort>().is_err());
        assert!("name,sideways".parse::<Sort>().is_err());
        assert!("name,asc,extra".parse::<Sort>().is_err());
    }

    #[test]
    fn test_sort_holds_a_single_order() {
        let sort = "name,desc".parse::<Sort>().unwrap();
        assert_eq!(
            sort.order(),
            Some(SortOrder {
                property: SortProperty::Name,
                direction: Direction::Desc,
            })
        );
        assert_eq!(Sort::unsorted().order(), None);
        assert!(Sort::default().is_unsorted());
    }

    #[test]
    fn test_page_metadata() {
        let request = PageRequest::of(1, 5);
        let page = Page::new(vec!["f", "g"], &request, 7);

        assert_eq!(page.number, 1);
        assert_eq!(page.size, 5);
        assert_eq!(page.total_elements, 7);
        assert_eq!(page.total_pages, 2);
        assert_eq!(request.offset(), 5);
    }

    #[test]
    fn test_zero_size_page_has_no_pages() {
        let page: Page<u8> = Page::new(Vec::new(), &PageRequest::of(0, 0), 3);
        assert_eq!(page.total_pages, 0);
        assert!(page.is_empty());
    }

    #[test]
    fn test_page_serializes_camel_case() {
        let page = Page::new(vec![1], &PageRequest::of(0, 5), 1).map(|n| n * 10);
        let json = serde_json::to_value(&page).unwrap();

        assert_eq!(json["content"], serde_json::json!([10]));
        assert_eq!(json["totalElements"], 1);
        assert_eq!(json["totalPages"], 1);
    }
}
